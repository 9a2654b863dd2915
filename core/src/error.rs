//! Error taxonomy shared by every component of the crate.
//!
//! A missing model resource is not an error: lookups report it as `Ok(None)`.
use std::path::PathBuf;

/// Errors raised while training, encoding, decoding or loading language models.
///
/// The enum is `Clone` so that a failed cache load can be handed out to every
/// later caller of the same key without re-parsing the resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// N-gram order outside `1..=5`.
    #[error("invalid n-gram order {0}, expected a value in 1..=5")]
    InvalidOrder(usize),

    /// An n-gram's prefix is missing from, or undercounted in, the lower-order frequencies.
    #[error("prefix {prefix:?} of n-gram {ngram:?} has no consistent count in the lower-order frequencies")]
    CascadeInvariantViolation { ngram: String, prefix: String },

    /// A binary model resource could not be parsed.
    #[error("corrupt model resource {resource}: {reason}")]
    CorruptResource { resource: String, reason: String },

    /// An entry handed to the encoder cannot be stored.
    #[error("cannot encode n-gram {ngram:?}: {reason}")]
    InvalidEntry { ngram: String, reason: String },

    #[error("invalid character class {class:?}: {reason}")]
    InvalidCharClass { class: String, reason: String },

    #[error("invalid language code {0:?}")]
    InvalidLanguage(String),

    #[error("i/o error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ModelError {
    pub(crate) fn corrupt(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::CorruptResource {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        ModelError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether this error marks a damaged or incompatible resource file.
    pub fn is_corrupt_resource(&self) -> bool {
        matches!(self, ModelError::CorruptResource { .. })
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
