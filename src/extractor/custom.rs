//! Built-in custom extraction functions
//!
//! Ready-made decompositions for common image hosts. They can be referenced
//! by name from JSON configurations (`"extract": {"custom": "s3"}`).

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{CustomExtractor, ExtractedRecord};

static CLOUDINARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"cloudinary\.com/([^/]+)/image/upload/(?:.*/)?(v\d+)/(.+)\.([^.]+)$")
        .expect("cloudinary pattern is valid")
});

/// Names accepted by [`builtin`]
pub const BUILTIN_NAMES: &[&str] = &["cloudinary", "s3", "standard"];

/// Look up a built-in extractor by name
pub fn builtin(name: &str) -> Option<CustomExtractor> {
    let func: fn(&str) -> Option<ExtractedRecord> = match name {
        "cloudinary" => extract_cloudinary_url,
        "s3" => extract_s3_url,
        "standard" => extract_standard_url,
        _ => return None,
    };
    Some(CustomExtractor::from_fn(name, func))
}

/// Components of a Cloudinary delivery URL.
///
/// `base` is everything before the version segment, so templates can rebuild
/// the URL with new transformations.
pub fn extract_cloudinary_url(src: &str) -> Option<ExtractedRecord> {
    let caps = CLOUDINARY_RE.captures(src)?;
    let version = caps.get(2)?;
    // Drop the '/' in front of the version segment
    let base = src[..version.start()].trim_end_matches('/');

    let mut record = ExtractedRecord::new();
    record.insert("account".into(), caps[1].to_string());
    record.insert("publicId".into(), caps[3].to_string());
    record.insert("ext".into(), caps[4].to_string());
    record.insert("base".into(), base.to_string());
    Some(record)
}

/// Components of an S3 object URL
pub fn extract_s3_url(src: &str) -> Option<ExtractedRecord> {
    let url = Url::parse(src).ok()?;
    let host = url.host_str()?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();
    let filename = segments.last().copied().unwrap_or("");
    let (name, ext) = split_filename(filename);

    let bucket = host.split('.').next().unwrap_or("");
    let region = host
        .split_once(".s3.")
        .and_then(|(_, rest)| rest.split('.').next())
        .unwrap_or("us-east-1");

    let mut record = ExtractedRecord::new();
    record.insert("bucket".into(), bucket.to_string());
    record.insert(
        "path".into(),
        segments[..segments.len().saturating_sub(1)].join("/"),
    );
    record.insert("name".into(), name.to_string());
    record.insert("ext".into(), ext.to_string());
    record.insert("region".into(), region.to_string());
    Some(record)
}

/// Components of any URL, resolving relative sources against a dummy origin
pub fn extract_standard_url(src: &str) -> Option<ExtractedRecord> {
    let mut record = ExtractedRecord::new();

    let resolved = Url::parse("https://example.com")
        .and_then(|base| base.join(src))
        .ok();

    match resolved {
        Some(url) => {
            let segments: Vec<&str> = url
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).collect())
                .unwrap_or_default();
            let (name, ext) = split_filename(segments.last().copied().unwrap_or(""));

            record.insert("protocol".into(), url.scheme().to_string());
            record.insert("domain".into(), url.host_str().unwrap_or("").to_string());
            record.insert(
                "path".into(),
                segments[..segments.len().saturating_sub(1)].join("/"),
            );
            record.insert("filename".into(), name.to_string());
            record.insert("ext".into(), ext.to_string());
            record.insert(
                "query".into(),
                url.query().map(|q| format!("?{}", q)).unwrap_or_default(),
            );
        }
        None => {
            let parts: Vec<&str> = src.split('/').filter(|p| !p.is_empty()).collect();
            let (name, ext) = split_filename(parts.last().copied().unwrap_or(""));

            record.insert(
                "path".into(),
                parts[..parts.len().saturating_sub(1)].join("/"),
            );
            record.insert("filename".into(), name.to_string());
            record.insert("ext".into(), ext.to_string());
        }
    }

    Some(record)
}

// "photo.large.jpg" -> ("photo", "large"), matching a two-way split on '.'
fn split_filename(filename: &str) -> (&str, &str) {
    let mut parts = filename.split('.');
    let name = parts.next().unwrap_or("");
    let ext = parts.next().unwrap_or("");
    (name, ext)
}
