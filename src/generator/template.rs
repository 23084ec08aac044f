//! Template inspection helpers

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::extractor::ExtractedRecord;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder pattern is valid"));

/// Placeholders always supplied by the generator
pub const BUILTIN_PLACEHOLDERS: &[&str] = &["width", "format"];

/// Replace every `{name}` in a single pass over `template`.
///
/// Names `lookup` has no value for stay literal. Substituted text is not
/// searched again, so a value that looks like a placeholder is kept as is.
pub(crate) fn fill<'v>(template: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| match lookup(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Distinct placeholder names in order of first appearance
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(template) {
        let name = &caps[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Outcome of checking a record against a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateCheck {
    pub valid: bool,
    pub missing: Vec<String>,
}

/// Report placeholders the record cannot fill
pub fn validate_template_data(template: &str, record: &ExtractedRecord) -> TemplateCheck {
    let missing: Vec<String> = extract_placeholders(template)
        .into_iter()
        .filter(|name| {
            !BUILTIN_PLACEHOLDERS.contains(&name.as_str()) && !record.contains_key(name)
        })
        .collect();

    TemplateCheck {
        valid: missing.is_empty(),
        missing,
    }
}

/// Substitute `record` over `fallbacks`; fields present in both take the
/// record's value
pub fn process_template(
    template: &str,
    record: &ExtractedRecord,
    fallbacks: &ExtractedRecord,
) -> String {
    let mut merged = fallbacks.clone();
    merged.extend(record.iter().map(|(k, v)| (k.clone(), v.clone())));

    fill(template, |key| merged.get(key).map(String::as_str))
}
