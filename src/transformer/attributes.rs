//! Attribute carry-over and serialization for rendered markup

use crate::html::Attributes;

/// Attributes every builder recomputes
const REPLACED: &[&str] = &["src", "srcset", "sizes"];

/// Copy `original` without `src`/`srcset`/`sizes`, then apply `updates`.
///
/// Updates overwrite in place when the attribute survived, otherwise they are
/// appended in the order given. `None` updates are skipped.
pub fn preserve_attributes(original: &Attributes, updates: &[(&str, Option<&str>)]) -> Attributes {
    let mut preserved: Attributes = original
        .iter()
        .filter(|(name, _)| !REPLACED.contains(name))
        .collect();

    for (name, value) in updates {
        if let Some(value) = value {
            preserved.set(name, *value);
        }
    }

    preserved
}

/// ` name="value"` pairs, each value escaped
pub fn serialize_attributes(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", name, escape_attribute_value(value)))
        .collect()
}

/// Escape `&`, `"`, `<` and `>`
pub fn escape_attribute_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// `<name attrs>`
pub fn start_tag(name: &str, attributes: &Attributes) -> String {
    format!("<{}{}>", name, serialize_attributes(attributes))
}
