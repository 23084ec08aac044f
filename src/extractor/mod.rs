//! URL component extraction
//!
//! Turns an image source URL into a flat record of named fields, either from
//! a regular expression with a group mapping or from a custom function.

pub mod custom;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::TransformError;

/// Named fields pulled out of a source URL
pub type ExtractedRecord = BTreeMap<String, String>;

/// Error type custom extraction functions may fail with
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type ExtractFn = dyn Fn(&str) -> Result<Option<ExtractedRecord>, BoxError> + Send + Sync;

/// Extraction strategy of a rule. Exactly one is active.
#[derive(Debug, Clone)]
pub enum ExtractSpec {
    Pattern(PatternExtract),
    Custom(CustomExtractor),
}

impl ExtractSpec {
    /// Pattern strategy from a string regex and `(field, group)` pairs
    pub fn pattern(pattern: &str, groups: &[(&str, usize)]) -> Result<Self, regex::Error> {
        Ok(ExtractSpec::Pattern(PatternExtract::parse(
            pattern,
            groups.iter().map(|(name, idx)| (*name, *idx)),
        )?))
    }

    /// Custom strategy from an infallible function
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Option<ExtractedRecord> + Send + Sync + 'static,
    {
        ExtractSpec::Custom(CustomExtractor::from_fn(name, func))
    }
}

/// Regular expression plus a mapping from output field to capture group
#[derive(Debug, Clone)]
pub struct PatternExtract {
    pattern: Regex,
    groups: Vec<(String, usize)>,
}

impl PatternExtract {
    pub fn new<K: Into<String>>(pattern: Regex, groups: impl IntoIterator<Item = (K, usize)>) -> Self {
        Self {
            pattern,
            groups: groups.into_iter().map(|(k, i)| (k.into(), i)).collect(),
        }
    }

    /// Compile `pattern` once and keep it with the group mapping
    pub fn parse<K: Into<String>>(
        pattern: &str,
        groups: impl IntoIterator<Item = (K, usize)>,
    ) -> Result<Self, regex::Error> {
        Ok(Self::new(Regex::new(pattern)?, groups))
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn groups(&self) -> &[(String, usize)] {
        &self.groups
    }
}

/// User-supplied extraction function.
///
/// `Ok(None)` means "no match" and only skips the image; `Err` aborts the
/// whole transformation.
#[derive(Clone)]
pub struct CustomExtractor {
    name: String,
    func: Arc<ExtractFn>,
}

impl CustomExtractor {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<Option<ExtractedRecord>, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn from_fn<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Option<ExtractedRecord> + Send + Sync + 'static,
    {
        Self::new(name, move |url| Ok(func(url)))
    }

    /// One of the built-in extractors by name: `cloudinary`, `s3`, `standard`
    pub fn builtin(name: &str) -> Option<Self> {
        custom::builtin(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, url: &str) -> Result<Option<ExtractedRecord>, BoxError> {
        (self.func)(url)
    }
}

impl fmt::Debug for CustomExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomExtractor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Extract URL components according to `spec`.
///
/// Returns `Ok(None)` when the URL does not match; an error only when a
/// custom function fails.
pub fn extract(url: &str, spec: &ExtractSpec) -> Result<Option<ExtractedRecord>, TransformError> {
    match spec {
        ExtractSpec::Custom(custom) => {
            let record = custom
                .call(url)
                .map_err(|e| TransformError::ExtractionFailed {
                    url: url.to_string(),
                    reason: format!("custom extractor '{}' failed: {}", custom.name(), e),
                })?;
            Ok(record.filter(|r| !r.is_empty()))
        }
        ExtractSpec::Pattern(pattern) => Ok(extract_with_pattern(url, pattern)),
    }
}

fn extract_with_pattern(url: &str, spec: &PatternExtract) -> Option<ExtractedRecord> {
    if spec.groups.is_empty() {
        return None;
    }
    let caps = spec.pattern.captures(url)?;

    let record: ExtractedRecord = spec
        .groups
        .iter()
        .filter_map(|(name, idx)| {
            caps.get(*idx)
                .map(|m| m.as_str())
                .filter(|s| !s.is_empty())
                .map(|s| (name.clone(), s.to_string()))
        })
        .collect();

    if record.is_empty() {
        None
    } else {
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_spec() -> ExtractSpec {
        ExtractSpec::pattern(
            r"^(.+)/([^/]+)\.([^.]+)$",
            &[("basePath", 1), ("filename", 2), ("ext", 3)],
        )
        .unwrap()
    }

    #[test]
    fn test_pattern_extraction() {
        let record = extract("https://cdn.example.com/images/hero.jpg", &standard_spec())
            .unwrap()
            .unwrap();

        assert_eq!(record["basePath"], "https://cdn.example.com/images");
        assert_eq!(record["filename"], "hero");
        assert_eq!(record["ext"], "jpg");
    }

    #[test]
    fn test_pattern_no_match() {
        assert!(extract("no-slashes-here", &standard_spec()).unwrap().is_none());
    }

    #[test]
    fn test_empty_groups_is_no_match() {
        let spec = ExtractSpec::pattern(r"^(.+)$", &[]).unwrap();
        assert!(extract("anything.jpg", &spec).unwrap().is_none());
    }

    #[test]
    fn test_only_captured_groups_are_included() {
        let spec = ExtractSpec::pattern(
            r"^(?:(\w+)://)?([^?]+)(\?.*)?$",
            &[("scheme", 1), ("path", 2), ("query", 3), ("missing", 9)],
        )
        .unwrap();

        let record = extract("img/a.png", &spec).unwrap().unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record["path"], "img/a.png");

        // A match where no declared group captured anything is a failure
        let spec = ExtractSpec::pattern(r"^img(x)?", &[("x", 1)]).unwrap();
        assert!(extract("img/a.png", &spec).unwrap().is_none());
    }

    #[test]
    fn test_custom_none_and_empty_are_no_match() {
        let none = ExtractSpec::custom("none", |_| None);
        assert!(extract("a.jpg", &none).unwrap().is_none());

        let empty = ExtractSpec::custom("empty", |_| Some(ExtractedRecord::new()));
        assert!(extract("a.jpg", &empty).unwrap().is_none());
    }

    #[test]
    fn test_custom_error_propagates() {
        let failing = ExtractSpec::Custom(CustomExtractor::new("boom", |_| {
            Err("Custom extraction failed".into())
        }));

        let err = extract("test.jpg", &failing).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ExtractionFailed);
        assert!(err.to_string().contains("Custom extraction failed"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let spec = standard_spec();
        let url = "https://cdn.example.com/a/b/photo.webp";
        assert_eq!(extract(url, &spec).unwrap(), extract(url, &spec).unwrap());
    }
}
