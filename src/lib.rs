//! Responsive image rewriting for HTML
//!
//! Rewrites `<img>` elements into `<picture>` or `srcset` markup driven by
//! an ordered list of rules:
//! - selector matching (full CSS, or a reduced hand-written matcher)
//! - URL component extraction (regex groups or custom functions)
//! - width × format URL generation from templates
//! - `<picture>` / `srcset` rendering that keeps unrelated attributes
//!
//! Markup that no rule touches is returned byte for byte.

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod ffi;
pub mod generator;
pub mod html;
pub mod selector;
pub mod transformer;

pub use config::{validate, Config, Loading, OutputKind, Rule, ValidationResult};
pub use error::{ErrorCode, TransformError};
pub use extractor::{extract, CustomExtractor, ExtractSpec, ExtractedRecord, PatternExtract};
pub use transformer::{TransformResult, TransformStats, Transformer};

/// Validate `config` and transform `html` with the default engine
pub fn responsify(html: &str, config: &Config) -> TransformResult {
    Transformer::default().process(html, config)
}

/// Async variant of [`responsify`], yielding between batches of images
pub async fn responsify_async(html: &str, config: &Config) -> TransformResult {
    Transformer::default().process_async(html, config).await
}
