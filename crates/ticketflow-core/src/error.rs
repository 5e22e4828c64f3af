use thiserror::Error;

#[derive(Debug, Error)]
pub enum TicketflowError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid status code '{0}': must be lowercase alphanumeric with underscores")]
    InvalidCode(String),

    #[error("status code already exists: {0}")]
    DuplicateCode(String),

    #[error("status '{0}' cannot be final with a running SLA clock")]
    InvalidSlaCombination(String),

    #[error("locked: {0}")]
    Locked(String),

    #[error("status '{status}' is still bound by workflow '{graph}'")]
    ReferencedByGraph { status: String, graph: String },

    #[error("status '{0}' is already present in this workflow")]
    AlreadyPresent(String),

    #[error("transition source and destination are the same node")]
    SelfLoop,

    #[error("no transition may leave final status '{0}'")]
    TransitionFromFinal(String),

    #[error("no transition may target entry status '{0}'")]
    TransitionToEntry(String),

    #[error("transition from '{from}' to '{to}' already exists")]
    DuplicateTransition { from: String, to: String },

    #[error("workflow '{0}' has no entry node")]
    NoEntry(String),

    #[error("invalid status category: {0}")]
    InvalidCategory(String),

    #[error("invalid sla behavior: {0}")]
    InvalidSlaBehavior(String),

    #[error("invalid role tier: {0}")]
    InvalidTier(String),

    #[error("status not found: {0}")]
    StatusNotFound(String),

    #[error("workflow not found: {0}")]
    GraphNotFound(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("transition not found: {0}")]
    TransitionNotFound(String),

    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TicketflowError>;
