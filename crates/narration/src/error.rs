use thiserror::Error;

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("Narration engine is no longer running")]
    EngineStopped,

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),
}

pub type Result<T> = std::result::Result<T, NarrationError>;
