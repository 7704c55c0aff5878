pub mod plan;
pub mod task;

pub use plan::*;
pub use task::*;
