use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors surfaced by the reading layer.
///
/// Collaborator failures keep their own type through `#[from]`; the variants
/// defined here are the reading layer's own misuses.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Storage(#[from] vorleser_storage::StorageError),

    #[error(transparent)]
    Client(#[from] vorleser_client::ClientError),

    #[error(transparent)]
    Narration(#[from] vorleser_narration::NarrationError),

    #[error("The novel has no chapters")]
    NoChapters,

    #[error("The reading session is already closed")]
    SessionClosed,

    #[error("No reading list with id '{id}'")]
    ListNotFound { id: String },

    #[error("The built-in Downloads list cannot be changed or removed")]
    ProtectedList,

    #[error("No bookmark with id '{id}'")]
    BookmarkNotFound { id: Uuid },
}

impl ReaderError {
    /// Whether retrying the operation can reasonably succeed. Network
    /// failures are retriable; everything else is not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ReaderError::Client(e) => e.is_recoverable(),
            _ => false,
        }
    }
}
