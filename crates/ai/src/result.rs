use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("generation failed: {0}")]
    GenerationFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}
