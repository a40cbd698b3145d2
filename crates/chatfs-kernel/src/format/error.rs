//! Formatter error types.

use thiserror::Error;

/// Formatter error type.
#[derive(Debug, Error)]
pub enum FormatError {
    /// A template failed to compile; nothing was installed.
    #[error("template {index} is invalid: {reason}")]
    TemplateSyntax { index: usize, reason: String },

    /// A template failed while rendering a message.
    #[error("template {index} failed on message {message_id}: {reason}")]
    TemplateRender {
        index: usize,
        message_id: String,
        reason: String,
    },

    /// An empty template list was offered.
    #[error("at least one template is required")]
    NoTemplates,

    /// The configured delimiter can't be used in delimited text.
    #[error("invalid delimiter {0:?}: must be one ASCII character other than a quote or line break")]
    InvalidDelimiter(char),

    /// An encoded row was not valid UTF-8.
    #[error("encoded row is not UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

impl FormatError {
    /// Create a TemplateSyntax error.
    pub fn syntax(index: usize, reason: impl Into<String>) -> Self {
        Self::TemplateSyntax {
            index,
            reason: reason.into(),
        }
    }

    /// Create a TemplateRender error.
    pub fn render(index: usize, message_id: impl ToString, reason: impl Into<String>) -> Self {
        Self::TemplateRender {
            index,
            message_id: message_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Formatter result type.
pub type FormatResult<T> = Result<T, FormatError>;
