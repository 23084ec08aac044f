//! `<img srcset>` builder

use super::attributes::{preserve_attributes, start_tag};
use super::BuildInput;
use crate::generator::{generate_srcset, select_default_src, GeneratedUrl};

/// Render a single `<img>` with `srcset` for one target format.
///
/// The target is the rule's first format, or the first generated one. With
/// no URLs for it the original `src` is kept and `srcset` is omitted.
pub fn build_srcset(input: &BuildInput<'_>) -> String {
    let target = input
        .formats
        .first()
        .map(String::as_str)
        .or_else(|| input.urls.first().map(|u| u.format.as_str()));

    let urls: Vec<&GeneratedUrl> = match target {
        Some(target) => input.urls.iter().filter(|u| u.format == target).collect(),
        None => Vec::new(),
    };

    let srcset = (!urls.is_empty()).then(|| generate_srcset(urls.iter().copied()));
    let candidates: Vec<&str> = urls.iter().map(|u| u.url.as_str()).collect();
    let src = select_default_src(input.widths, &candidates).or(input.original.get("src"));

    let sizes = input.sizes.or(input.original.get("sizes"));
    let loading = input.loading.map(|l| l.as_str());

    let attributes = preserve_attributes(
        input.original,
        &[
            ("src", src),
            ("srcset", srcset.as_deref()),
            ("sizes", sizes),
            ("loading", loading),
        ],
    );

    start_tag("img", &attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Loading;
    use crate::extractor::ExtractedRecord;
    use crate::generator::generate_urls;
    use crate::html::Attributes;

    fn urls(formats: &[&str]) -> Vec<GeneratedUrl> {
        let record: ExtractedRecord = [("name".to_string(), "photo".to_string())].into();
        let formats: Vec<String> = formats.iter().map(|f| f.to_string()).collect();
        generate_urls("/img/{name}-{width}.{format}", &record, &[400, 800, 1200], &formats)
    }

    #[test]
    fn test_srcset_for_first_format() {
        let original: Attributes = [("src", "photo.jpg"), ("alt", "A photo"), ("class", "wide")]
            .into_iter()
            .collect();
        let generated = urls(&["webp", "avif"]);
        let formats = vec!["webp".to_string(), "avif".to_string()];

        let html = build_srcset(&BuildInput {
            urls: &generated,
            original: &original,
            widths: &[400, 800, 1200],
            formats: &formats,
            sizes: Some("100vw"),
            loading: Some(Loading::Lazy),
            record: &ExtractedRecord::new(),
        });

        assert_eq!(
            html,
            r#"<img alt="A photo" class="wide" src="/img/photo-800.webp" srcset="/img/photo-400.webp 400w, /img/photo-800.webp 800w, /img/photo-1200.webp 1200w" sizes="100vw" loading="lazy">"#
        );
    }

    #[test]
    fn test_keeps_original_sizes_and_loading() {
        let original: Attributes = [("loading", "eager"), ("src", "a.jpg"), ("sizes", "50vw")]
            .into_iter()
            .collect();
        let generated = urls(&["original"]);

        let html = build_srcset(&BuildInput {
            urls: &generated,
            original: &original,
            widths: &[400, 800, 1200],
            formats: &[],
            sizes: None,
            loading: None,
            record: &ExtractedRecord::new(),
        });

        assert!(html.starts_with(r#"<img loading="eager" src="/img/photo-800.jpg""#));
        assert!(html.ends_with(r#"sizes="50vw">"#));
    }

    #[test]
    fn test_no_urls_falls_back_to_original_src() {
        let original: Attributes = [("src", "a.jpg"), ("alt", "")].into_iter().collect();

        let html = build_srcset(&BuildInput {
            urls: &[],
            original: &original,
            widths: &[400],
            formats: &["webp".to_string()],
            sizes: None,
            loading: None,
            record: &ExtractedRecord::new(),
        });

        assert_eq!(html, r#"<img alt="" src="a.jpg">"#);
    }
}
