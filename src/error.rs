use thiserror::Error;

/// Errors raised by the writer. All of these are usage errors: a failed
/// call validates before mutating and leaves the writer unchanged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WriterError {
    #[error("invalid indentation: {0}")]
    InvalidIndentation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("position {position} is past the end of the text (length {length})")]
    OutOfRange { position: usize, length: usize },
}

impl WriterError {
    pub(crate) fn negative_level() -> Self {
        Self::InvalidIndentation("indentation level must be zero or greater".into())
    }

    pub(crate) fn non_whitespace(text: &str) -> Self {
        Self::InvalidIndentation(format!(
            "indentation text must be empty or contain only spaces and tabs, got {text:?}"
        ))
    }
}
