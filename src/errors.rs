use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("COLLABORATOR_FAILURE: {0}")]
    Collaborator(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<std::io::Error> for EngineError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Collaborator(value.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
