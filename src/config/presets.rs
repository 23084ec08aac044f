//! Built-in preset configurations

use serde::Serialize;

use super::{Config, ConfigError, Loading, OutputKind, Rule};
use crate::extractor::custom::{extract_cloudinary_url, extract_standard_url};
use crate::extractor::{ExtractSpec, ExtractedRecord, PatternExtract};

/// Names of all registered presets
pub const PRESET_NAMES: &[&str] = &["cloudinary", "standard"];

/// A named rule set
#[derive(Debug, Clone, Serialize)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    pub transforms: Vec<Rule>,
}

pub fn available_presets() -> Vec<&'static str> {
    PRESET_NAMES.to_vec()
}

pub fn preset_info(name: &str) -> Option<Preset> {
    match name {
        "cloudinary" => Some(cloudinary()),
        "standard" => Some(standard()),
        _ => None,
    }
}

/// Build a configuration from a preset. Non-empty `overrides` replace the
/// preset's own rules.
pub fn load_preset(name: &str, overrides: Vec<Rule>) -> Result<Config, ConfigError> {
    let preset = preset_info(name).ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))?;

    let transforms = if overrides.is_empty() {
        preset.transforms
    } else {
        overrides
    };

    Ok(Config {
        transforms,
        preset: Some(name.to_string()),
    })
}

fn cloudinary() -> Preset {
    let extract = ExtractSpec::custom("cloudinary", |src: &str| {
        if let Some(record) = extract_cloudinary_url(src) {
            return Some(record);
        }
        // Cloudinary-hosted but not a versioned upload URL
        if !src.contains("cloudinary") {
            return None;
        }
        let standard = extract_standard_url(src)?;
        let mut record: ExtractedRecord = standard.clone();
        if let Some(filename) = standard.get("filename") {
            record.insert("publicId".into(), filename.clone());
        }
        if let (Some(protocol), Some(domain)) = (standard.get("protocol"), standard.get("domain")) {
            let path = standard.get("path").map(String::as_str).unwrap_or("");
            record.insert("base".into(), format!("{}://{}/{}", protocol, domain, path));
        }
        Some(record)
    });

    Preset {
        name: "cloudinary",
        description: "Optimized for Cloudinary image CDN",
        transforms: vec![Rule::new(
            "img",
            extract,
            "{base}/w_{width},f_{format}/{publicId}",
            vec![400, 800, 1200, 1600],
            OutputKind::Srcset,
        )
        .with_formats(["auto"])],
    }
}

fn standard() -> Preset {
    let pattern = PatternExtract::new(
        regex::Regex::new(r"^(.*)/([^/]+)\.([^.]+)$").expect("standard preset pattern is valid"),
        [("basePath", 1), ("filename", 2), ("ext", 3)],
    );

    Preset {
        name: "standard",
        description: "Standard responsive image configuration",
        transforms: vec![Rule::new(
            "img",
            ExtractSpec::Pattern(pattern),
            "{basePath}/{filename}_{width}w.{format}",
            vec![320, 640, 960, 1280, 1920],
            OutputKind::Picture,
        )
        .with_formats(["webp", "original"])
        .with_sizes("(max-width: 640px) 100vw, (max-width: 1280px) 50vw, 33vw")
        .with_loading(Loading::Lazy)],
    }
}
