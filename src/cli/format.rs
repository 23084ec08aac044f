//! Output rendering

use clap::ValueEnum;

use crate::transformer::TransformResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Transformed HTML only
    Html,
    /// Full result envelope with statistics
    Json,
}

/// Render `result` for output
pub fn format_output(result: &TransformResult, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(result),
        OutputFormat::Html => Ok(result.html().unwrap_or_default().to_string()),
    }
}
