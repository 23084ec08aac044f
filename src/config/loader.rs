//! JSON configuration loading
//!
//! Configurations are read into permissive raw structs first so that every
//! structural problem can be reported at once, then converted into typed
//! [`Rule`]s.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::presets::load_preset;
use super::{Config, Loading, OutputKind, Rule};
use crate::extractor::custom::BUILTIN_NAMES;
use crate::extractor::{CustomExtractor, ExtractSpec, PatternExtract};

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default, alias = "rules")]
    transforms: Option<Vec<RawRule>>,
    #[serde(default)]
    preset: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    #[serde(default)]
    selector: Option<String>,
    #[serde(default)]
    extract: Option<RawExtract>,
    #[serde(default)]
    url_template: Option<String>,
    #[serde(default)]
    widths: Option<Vec<Value>>,
    #[serde(default)]
    formats: Option<Vec<String>>,
    #[serde(default, rename = "type", alias = "outputKind")]
    output: Option<String>,
    #[serde(default)]
    sizes: Option<String>,
    #[serde(default)]
    loading: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawExtract {
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    groups: Option<BTreeMap<String, usize>>,
    /// Name of a built-in extractor
    #[serde(default)]
    custom: Option<String>,
}

/// Read and parse a JSON configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path.as_ref())?;
    parse_config(&content)
}

/// Parse a JSON configuration.
///
/// A `preset` without `transforms` expands to the preset's rules; explicit
/// transforms replace the preset's.
pub fn parse_config(json: &str) -> Result<Config, ConfigError> {
    let raw: RawConfig = serde_json::from_str(json)?;

    let transforms = match (raw.transforms, raw.preset.as_deref()) {
        (Some(rules), _) => convert_rules(rules)?,
        (None, Some(_)) => Vec::new(),
        (None, None) => {
            return Err(ConfigError::Validation(vec![
                "Configuration must have a transforms array".to_string(),
            ]))
        }
    };

    match raw.preset {
        Some(name) => load_preset(&name, transforms),
        None => Ok(Config::new(transforms)),
    }
}

fn convert_rules(raw: Vec<RawRule>) -> Result<Vec<Rule>, ConfigError> {
    let mut errors = Vec::new();
    let mut rules = Vec::with_capacity(raw.len());

    for (index, rule) in raw.into_iter().enumerate() {
        match convert_rule(rule) {
            Ok(rule) => rules.push(rule),
            Err(rule_errors) => errors.extend(
                rule_errors
                    .into_iter()
                    .map(|e| format!("Transform {}: {}", index, e)),
            ),
        }
    }

    if errors.is_empty() {
        Ok(rules)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

fn convert_rule(raw: RawRule) -> Result<Rule, Vec<String>> {
    let mut errors = Vec::new();

    if raw.selector.is_none() {
        errors.push("selector is required and must be a string".to_string());
    }
    if raw.url_template.is_none() {
        errors.push("urlTemplate is required and must be a string".to_string());
    }

    let extract = match raw.extract {
        None => {
            errors.push("extract configuration is required".to_string());
            None
        }
        Some(extract) => convert_extract(extract)
            .map_err(|e| errors.push(e))
            .ok(),
    };

    let widths = match raw.widths {
        None => {
            errors.push("widths must be an array".to_string());
            None
        }
        Some(values) => convert_widths(&values).map_err(|e| errors.push(e)).ok(),
    };

    let output = match raw.output.as_deref().map(str::parse::<OutputKind>) {
        Some(Ok(kind)) => Some(kind),
        _ => {
            errors.push(r#"type must be either "picture" or "srcset""#.to_string());
            None
        }
    };

    let loading = match raw.loading.as_deref().map(str::parse::<Loading>) {
        None => None,
        Some(Ok(loading)) => Some(loading),
        Some(Err(_)) => {
            errors.push(r#"loading must be either "lazy" or "eager" if provided"#.to_string());
            None
        }
    };

    match (raw.selector, extract, raw.url_template, widths, output) {
        (Some(selector), Some(extract), Some(url_template), Some(widths), Some(output))
            if errors.is_empty() =>
        {
            Ok(Rule {
                selector,
                extract,
                url_template,
                widths,
                formats: raw.formats,
                output,
                sizes: raw.sizes,
                loading,
            })
        }
        _ => Err(errors),
    }
}

fn convert_extract(raw: RawExtract) -> Result<ExtractSpec, String> {
    const EITHER: &str = "extract configuration must have either pattern+groups or custom function";

    match (raw.pattern, raw.groups, raw.custom) {
        (Some(_), _, Some(_)) => Err(format!("{}, not both", EITHER)),
        (None, _, Some(name)) => CustomExtractor::builtin(&name)
            .map(ExtractSpec::Custom)
            .ok_or_else(|| {
                format!(
                    "unknown custom extractor '{}' (expected one of: {})",
                    name,
                    BUILTIN_NAMES.join(", ")
                )
            }),
        (Some(pattern), Some(groups), None) => PatternExtract::parse(&pattern, groups)
            .map(ExtractSpec::Pattern)
            .map_err(|e| format!("invalid extract pattern: {}", e)),
        _ => Err(EITHER.to_string()),
    }
}

fn convert_widths(values: &[Value]) -> Result<Vec<u32>, String> {
    if values.is_empty() {
        return Err("widths array cannot be empty".to_string());
    }
    values
        .iter()
        .map(|v| {
            v.as_u64()
                .filter(|w| *w > 0)
                .and_then(|w| u32::try_from(w).ok())
        })
        .collect::<Option<Vec<u32>>>()
        .ok_or_else(|| "widths must contain only positive integers".to_string())
}
