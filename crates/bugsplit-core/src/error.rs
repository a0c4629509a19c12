use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single typed read against the attached process.
///
/// None of these are fatal: the caller treats the value as unknown for the
/// current tick and tries again on the next poll.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadFailure {
    #[error("Not attached to the game process")]
    NotAttached,

    #[error("Unreadable memory at address {address:#x}: {message}")]
    UnreadableMemory { address: u64, message: String },

    #[error("Malformed value: {0}")]
    MalformedValue(String),
}

impl ReadFailure {
    pub(crate) fn unreadable(address: u64, message: impl Into<String>) -> Self {
        ReadFailure::UnreadableMemory {
            address,
            message: message.into(),
        }
    }
}

impl From<Error> for ReadFailure {
    fn from(e: Error) -> Self {
        match e {
            Error::MemoryReadFailed { address, message } => {
                ReadFailure::UnreadableMemory { address, message }
            }
            other => ReadFailure::UnreadableMemory {
                address: 0,
                message: other.to_string(),
            },
        }
    }
}
