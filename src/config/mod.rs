//! Rule configuration
//!
//! Typed rules consumed by the engine, plus JSON loading, validation and
//! the preset registry.

pub mod loader;
pub mod presets;
pub mod validator;

pub use loader::{load_config, parse_config, ConfigError};
pub use presets::{available_presets, load_preset, preset_info, Preset};
pub use validator::{validate, validate_with, ValidationResult};

use std::fmt;
use std::str::FromStr;

use crate::extractor::ExtractSpec;
use crate::generator::ORIGINAL_FORMAT;

/// Markup produced for a matched image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// `<picture>` with one `<source>` per format
    Picture,
    /// Single `<img>` with `srcset`
    Srcset,
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "picture" => Ok(OutputKind::Picture),
            "srcset" => Ok(OutputKind::Srcset),
            _ => Err(format!("unknown output type '{}'", s)),
        }
    }
}

/// Value of the `loading` attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loading {
    Lazy,
    Eager,
}

impl Loading {
    pub fn as_str(&self) -> &'static str {
        match self {
            Loading::Lazy => "lazy",
            Loading::Eager => "eager",
        }
    }
}

impl FromStr for Loading {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lazy" => Ok(Loading::Lazy),
            "eager" => Ok(Loading::Eager),
            _ => Err(format!("unknown loading strategy '{}'", s)),
        }
    }
}

impl fmt::Display for Loading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transformation rule
#[derive(Debug, Clone)]
pub struct Rule {
    /// CSS selector for target images
    pub selector: String,
    pub extract: ExtractSpec,
    /// Template with `{field}`, `{width}` and `{format}` placeholders
    pub url_template: String,
    /// Widths in pixels, in output order
    pub widths: Vec<u32>,
    /// Formats to generate; `None` means `["original"]`
    pub formats: Option<Vec<String>>,
    pub output: OutputKind,
    pub sizes: Option<String>,
    pub loading: Option<Loading>,
}

impl Rule {
    pub fn new(
        selector: impl Into<String>,
        extract: ExtractSpec,
        url_template: impl Into<String>,
        widths: Vec<u32>,
        output: OutputKind,
    ) -> Self {
        Self {
            selector: selector.into(),
            extract,
            url_template: url_template.into(),
            widths,
            formats: None,
            output,
            sizes: None,
            loading: None,
        }
    }

    pub fn with_formats<S: Into<String>>(mut self, formats: impl IntoIterator<Item = S>) -> Self {
        self.formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    pub fn with_loading(mut self, loading: Loading) -> Self {
        self.loading = Some(loading);
        self
    }

    /// Declared formats, defaulting to `["original"]`
    pub fn effective_formats(&self) -> Vec<String> {
        match &self.formats {
            Some(formats) => formats.clone(),
            None => vec![ORIGINAL_FORMAT.to_string()],
        }
    }
}

/// A rule set, tried in order
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub transforms: Vec<Rule>,
    /// Preset the rules came from, if any
    pub preset: Option<String>,
}

impl Config {
    pub fn new(transforms: Vec<Rule>) -> Self {
        Self {
            transforms,
            preset: None,
        }
    }
}
