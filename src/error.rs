use thiserror::Error;

/// Stable error taxonomy for every fallible core operation.
///
/// The CLI maps each variant to a human message and an exit code; a missing
/// or malformed identifier is a user error, `StepFailed`/`ExecFailed`/
/// `PrepareStatementFailed` are treated as bugs worth a `doctor` run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    OpenFailed(String),

    #[error("failed to prepare statement: {0}")]
    PrepareStatementFailed(String),

    #[error("failed to bind parameter: {0}")]
    BindFailed(String),

    #[error("statement execution failed: {0}")]
    StepFailed(String),

    #[error("exec failed: {0}")]
    ExecFailed(String),

    #[error("{0}")]
    InvalidData(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("plan slug must be non-empty")]
    EmptyId,

    #[error("plan slug '{0}' is not kebab-case (lowercase ascii letters and hyphens, no leading/trailing hyphen)")]
    InvalidKebabCase(String),

    #[error("invalid task id '{0}'")]
    InvalidTaskId(String),

    #[error("adding this dependency would create a cycle")]
    CycleDetected,

    #[error("database connection already closed")]
    DatabaseClosed,

    #[error("not inside a taskgraph workspace")]
    NotAWorkspace,

    #[error("already inside a taskgraph workspace at {0}")]
    AlreadyInWorkspace(String),
}

impl StoreError {
    /// Stable machine-readable code, used by the CLI's JSON error output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OpenFailed(_) => "OPEN_FAILED",
            Self::PrepareStatementFailed(_) => "PREPARE_STATEMENT_FAILED",
            Self::BindFailed(_) => "BIND_FAILED",
            Self::StepFailed(_) => "STEP_FAILED",
            Self::ExecFailed(_) => "EXEC_FAILED",
            Self::InvalidData(_) => "INVALID_DATA",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::EmptyId => "EMPTY_ID",
            Self::InvalidKebabCase(_) => "INVALID_KEBAB_CASE",
            Self::InvalidTaskId(_) => "INVALID_TASK_ID",
            Self::CycleDetected => "CYCLE_DETECTED",
            Self::DatabaseClosed => "DATABASE_CLOSED",
            Self::NotAWorkspace => "NOT_A_WORKSPACE",
            Self::AlreadyInWorkspace(_) => "ALREADY_IN_WORKSPACE",
        }
    }

    /// `true` for variants that indicate a core/storage bug rather than a
    /// caller mistake — the CLI surfaces a "run `taskgraph doctor`" hint.
    pub fn is_bug(&self) -> bool {
        matches!(
            self,
            Self::PrepareStatementFailed(_)
                | Self::StepFailed(_)
                | Self::ExecFailed(_)
                | Self::BindFailed(_)
                | Self::DatabaseClosed
        )
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(_, _) => Self::StepFailed(e.to_string()),
            rusqlite::Error::InvalidParameterName(_)
            | rusqlite::Error::InvalidParameterCount(_, _)
            | rusqlite::Error::InvalidColumnType(_, _, _) => Self::BindFailed(e.to_string()),
            _ => Self::StepFailed(e.to_string()),
        }
    }
}
