use std::io;
use thiserror::Error;

/// Error types for asset decoding and pose evaluation
#[derive(Error, Debug)]
pub enum AnimError {
    /// I/O error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The magic tag at the start of a file does not match its format
    #[error("Malformed {format} header: expected magic '{expected}', got '{actual}'")]
    MalformedHeader {
        /// Format being decoded ("skeleton", "animation" or "model")
        format: &'static str,
        /// Expected magic tag
        expected: String,
        /// Magic tag found in the stream
        actual: String,
    },

    /// The stream ended before the data declared by the header
    #[error("Truncated stream while reading {context}: needed {needed} bytes, {available} available")]
    TruncatedStream {
        /// What was being read
        context: String,
        /// Bytes required by the declared counts
        needed: u64,
        /// Bytes left in the stream
        available: u64,
    },

    /// A caller or asset broke an invariant the runtime relies on
    #[error("Precondition violation: {0}")]
    PreconditionViolation(String),
}

impl AnimError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("{message}");
        Self::PreconditionViolation(message)
    }

    /// Returns true for failures caused by the asset bytes themselves
    pub fn is_load_failure(&self) -> bool {
        matches!(self, Self::MalformedHeader { .. } | Self::TruncatedStream { .. })
    }
}

/// Result type using AnimError
pub type Result<T> = std::result::Result<T, AnimError>;

/// Render a magic value the way it appears in the file on this host
pub(crate) fn magic_to_string(magic: u32) -> String {
    String::from_utf8_lossy(&magic.to_ne_bytes()).into_owned()
}
