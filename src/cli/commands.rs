use clap::{Parser, Subcommand};

const VERSION: &str = env!("GIT_VERSION");

#[derive(Parser)]
#[command(
    name = "taskgraph",
    version = VERSION,
    about = "Dependency-aware task tracker for coordinating parallel agent work",
    after_help = "\
NOTE:
  DB is stored at <workspace-root>/.taskgraph/graph.db
  Run `taskgraph init` before any other command.

EXIT CODES:
  0  Success
  1  Error (validation, missing row, cycle, etc.)

SMART IDS:
  A bare id (`auth`) or `slug:NNN` (`auth:003`) is resolved by shape: the
  presence of a colon means task, its absence means plan.

DEPENDENCY SEMANTICS:
  `task dep add <id> <blocks-on-id>` means <id> may not start until
  <blocks-on-id> completes. Adding an edge that would create a cycle is
  rejected; the edge set is left unchanged.

BULK COMPLETE:
  `task complete-bulk` accepts up to 100 ids on one invocation and is
  all-or-nothing: if any id fails to transition, none do. It does not
  cascade plan completion per task; run `taskgraph plan show <slug>`
  afterwards to see whether a plan finished."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a taskgraph workspace in this directory
    Init,

    /// Plan management
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Tasks that may run now (open, all blockers completed)
    Ready {
        /// Cap the number of tasks returned (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        limit: u32,
    },

    /// Tasks that are not completed and have at least one incomplete blocker
    Blocked,

    /// System-wide plan/task/ready/blocked counts
    Stats,

    /// Run the integrity and performance health checks
    Doctor,
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a new plan
    Create {
        /// Plan slug (kebab-case)
        slug: String,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List plans, optionally filtered by status
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a plan and its task-status counts
    Show {
        slug: String,
    },
    /// Update a plan's title and/or description
    Update {
        slug: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a plan, cascading to its tasks and dependency edges
    Delete {
        slug: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Create a task under a plan
    Create {
        /// Owning plan slug
        plan: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks, optionally filtered by status and/or plan
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        plan: Option<String>,
    },
    /// Show a single task
    Show {
        /// `slug:NNN` or a bare internal id
        id: String,
    },
    /// Update a task's title, description and/or status
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Start a task (open → in_progress)
    Start {
        id: String,
    },
    /// Complete a task (in_progress → completed)
    Complete {
        id: String,
    },
    /// Complete up to 100 tasks atomically; none transition if any fails
    CompleteBulk {
        #[arg(required = true, num_args = 1..=100)]
        ids: Vec<String>,
        /// Also run the plan-completion cascade once per touched plan
        #[arg(long)]
        cascade: bool,
    },
    /// Delete a task (rejected while anything still depends on it)
    Delete {
        id: String,
    },
    /// Manage dependency edges and inspect transitive chains
    #[command(subcommand)]
    Dep(DepCommands),
}

#[derive(Subcommand)]
pub enum DepCommands {
    /// Add an edge: <id> may not start until <blocks_on> completes
    Add {
        id: String,
        blocks_on: String,
    },
    /// Remove an edge
    Remove {
        id: String,
        blocks_on: String,
    },
    /// Every task transitively blocking <id>, depth-annotated
    Blockers {
        id: String,
    },
    /// Every task transitively depending on <id>
    Dependents {
        id: String,
    },
}
