use crate::scene::ActorId;

/// Result alias that carries the custom [`StagehandError`] type.
pub type Result<T> = std::result::Result<T, StagehandError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum StagehandError {
    /// A path was mutated outside of a `begin_path`/`end_path` bracket.
    #[error("path construction error: {0}")]
    Construction(String),
    /// A child behavior does not fit inside the time range of its container.
    #[error("behavior range [{start}, {end}] lies outside container range [0, {container}]")]
    BehaviorRange { start: f64, end: f64, container: f64 },
    /// A named resource (audio clip, image) has not been registered.
    #[error("{kind} `{id}` not found")]
    ResourceNotFound { kind: &'static str, id: String },
    /// The actor handle is stale or was never issued by this scene.
    #[error("actor {0} not found")]
    ActorNotFound(ActorId),
    #[error("invalid hierarchy: {0}")]
    InvalidHierarchy(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl StagehandError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub(crate) fn construction<T: Into<String>>(msg: T) -> Self {
        Self::Construction(msg.into())
    }

    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            kind,
            id: id.into(),
        }
    }
}

impl From<&str> for StagehandError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for StagehandError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
