use thiserror::Error;

use crate::name::NameError;

/// Errors raised while defining or synthesizing a stack.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("invalid name: {0}")]
    Name(#[from] NameError),

    #[error("invalid tag {0:?}: expected key=value")]
    InvalidTag(String),

    #[error("CORS policy must allow at least one origin")]
    EmptyCorsOrigins,

    #[error("template serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
