//! Error types for mask-core operations.
//!
//! None of these escape [`crate::TemplateEngine::resolve`] or
//! [`crate::extract_display_segment`]; both degrade to a display string. They
//! surface from the fallible building blocks (token composition, context
//! loading, desensitize rules, filters) and from
//! [`crate::TemplateEngine::evaluate`].

use thiserror::Error;

/// Errors that can occur while building tokens, loading a context, or
/// evaluating a placeholder expression.
#[derive(Error, Debug)]
pub enum MaskError {
    /// The context JSON could not be parsed.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The context JSON parsed, but its root is not an object.
    #[error("context root must be a JSON object, found {found}")]
    ContextNotObject { found: &'static str },

    /// A token segment cannot be carried by the wire format.
    #[error("invalid {field} segment {value:?}: {reason}")]
    InvalidSegment {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// The source does not satisfy the validation pattern of its kind.
    #[error("value does not match the {kind} pattern")]
    PatternMismatch { kind: &'static str },

    /// Fewer characters than the rule keeps visible.
    #[error("value too short to mask: {len} chars, rule keeps {keep}")]
    TooShort { len: usize, keep: usize },

    /// The source is not a `local@domain` address.
    #[error("invalid e-mail address")]
    InvalidEmail,

    /// Unknown desensitize kind name.
    #[error("unknown sensitive kind: {0}")]
    UnknownKind(String),

    /// A registered filter returned an error.
    #[error("filter '{name}' failed: {message}")]
    Filter { name: String, message: String },

    /// A registered filter panicked; the panic was contained.
    #[error("filter '{name}' panicked")]
    FilterPanicked { name: String },
}

/// Convenience alias used throughout mask-core.
pub type Result<T> = std::result::Result<T, MaskError>;
