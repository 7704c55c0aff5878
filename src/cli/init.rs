use crate::output;
use crate::workspace;

pub fn run(json: bool) -> i32 {
    match workspace::init_workspace() {
        Ok(path) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::success(serde_json::json!({
                        "path": path.to_string_lossy(),
                    })))
                    .unwrap()
                );
            } else {
                println!("Initialized taskgraph workspace at {}", path.display());
            }
            0
        }
        Err(e) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&output::json::error(&e)).unwrap());
            } else {
                eprintln!("Error: {e}");
            }
            1
        }
    }
}
