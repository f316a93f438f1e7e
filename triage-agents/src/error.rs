use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error("Failed to serialize prompt payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
