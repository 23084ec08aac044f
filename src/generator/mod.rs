//! URL generation from templates

pub mod template;

use serde::Serialize;

use crate::extractor::ExtractedRecord;

/// Format tag that resolves to the source image's own extension
pub const ORIGINAL_FORMAT: &str = "original";

/// One candidate URL of the width × format matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedUrl {
    pub url: String,
    pub width: u32,
    /// Declared format tag (`"original"` stays as-is here)
    pub format: String,
}

/// Expand `template` for one width and format.
///
/// Placeholders without a value are left untouched, so missing data shows up
/// as a visibly broken URL instead of failing the run. Substituted values are
/// never scanned for further placeholders.
pub fn generate_url(template: &str, record: &ExtractedRecord, width: u32, format: &str) -> String {
    let format = resolve_format(format, record);
    let width = width.to_string();

    template::fill(template, |key| match key {
        "width" => Some(width.as_str()),
        "format" => Some(format),
        _ => record.get(key).map(String::as_str),
    })
}

/// `"original"` becomes the record's `ext`, then `originalExt`, then `jpg`
pub fn resolve_format<'a>(format: &'a str, record: &'a ExtractedRecord) -> &'a str {
    if format != ORIGINAL_FORMAT {
        return format;
    }
    record
        .get("ext")
        .or_else(|| record.get("originalExt"))
        .map(String::as_str)
        .unwrap_or("jpg")
}

/// Every URL for the rule: formats outer, widths inner, in declaration order
pub fn generate_urls(
    template: &str,
    record: &ExtractedRecord,
    widths: &[u32],
    formats: &[String],
) -> Vec<GeneratedUrl> {
    formats
        .iter()
        .flat_map(|format| {
            widths.iter().map(move |&width| GeneratedUrl {
                url: generate_url(template, record, width, format),
                width,
                format: format.clone(),
            })
        })
        .collect()
}

/// `"url1 400w, url2 800w"`
pub fn generate_srcset<'a>(urls: impl IntoIterator<Item = &'a GeneratedUrl>) -> String {
    urls.into_iter()
        .map(|u| format!("{} {}w", u.url, u.width))
        .collect::<Vec<_>>()
        .join(", ")
}

/// MIME type for a `<source type>` attribute
pub fn mime_type(format: &str) -> Option<&'static str> {
    let mime = match format.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "tiff" => "image/tiff",
        // CDN-negotiated format
        "auto" => "image/webp",
        _ => return None,
    };
    Some(mime)
}

/// Default `src`: the middle width's URL, or the first one
pub fn select_default_src<'a>(widths: &[u32], urls: &[&'a str]) -> Option<&'a str> {
    urls.get(widths.len() / 2).or_else(|| urls.first()).copied()
}
