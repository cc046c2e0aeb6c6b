use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClmError>;

/// Infrastructure and state errors.
///
/// Domain feedback (validation messages, submission alerts, classification
/// misses) is not an error; it is carried as data and shown to the user.
#[derive(Debug, Error)]
pub enum ClmError {
    #[error("Question {index} already had its type chosen")]
    TypeLocked { index: usize },

    #[error("Index {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a Finish request was refused. `Display` is the alert text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("Please correct all input errors before finishing.")]
    InputErrors,

    #[error("Please answer all required questions: {}", .0.join(", "))]
    MissingRequired(Vec<String>),
}
