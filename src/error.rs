//! Error types for the transformation pipeline

use serde::Serialize;
use thiserror::Error;

/// Machine-readable failure category carried by every [`TransformError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidConfig,
    InvalidHtml,
    ExtractionFailed,
    SelectorError,
    GenerationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::InvalidHtml => "INVALID_HTML",
            ErrorCode::ExtractionFailed => "EXTRACTION_FAILED",
            ErrorCode::SelectorError => "SELECTOR_ERROR",
            ErrorCode::GenerationFailed => "GENERATION_FAILED",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised while validating, parsing, matching or rendering
#[derive(Debug, Error)]
pub enum TransformError {
    /// Rule set rejected before any HTML was touched
    #[error("Invalid configuration: {}", .0.join(", "))]
    InvalidConfig(Vec<String>),

    /// Input the parser could not tolerate
    #[error("Invalid HTML: {0}")]
    InvalidHtml(String),

    /// A custom extraction function failed (as opposed to returning no match)
    #[error("Failed to extract URL components from {url}: {reason}")]
    ExtractionFailed { url: String, reason: String },

    /// Syntactically invalid selector
    #[error("Invalid CSS selector: {selector} ({reason})")]
    Selector { selector: String, reason: String },

    /// Rendered markup could not be spliced back into the document
    #[error("Failed to generate markup: {0}")]
    GenerationFailed(String),
}

impl TransformError {
    pub fn code(&self) -> ErrorCode {
        match self {
            TransformError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            TransformError::InvalidHtml(_) => ErrorCode::InvalidHtml,
            TransformError::ExtractionFailed { .. } => ErrorCode::ExtractionFailed,
            TransformError::Selector { .. } => ErrorCode::SelectorError,
            TransformError::GenerationFailed(_) => ErrorCode::GenerationFailed,
        }
    }

    pub(crate) fn selector(selector: &str, reason: impl Into<String>) -> Self {
        TransformError::Selector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}
