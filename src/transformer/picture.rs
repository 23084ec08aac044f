//! `<picture>` builder

use super::attributes::{escape_attribute_value, preserve_attributes, start_tag};
use super::BuildInput;
use crate::generator::{generate_srcset, mime_type, select_default_src, GeneratedUrl, ORIGINAL_FORMAT};

/// Render `<picture>` with one `<source>` per format and a fallback `<img>`.
///
/// Typed sources follow the declared format order; the `original` bucket is
/// always the last, untyped source. Browsers take the first source they
/// support, so this order is significant.
pub fn build_picture(input: &BuildInput<'_>) -> String {
    let sizes = input.sizes.or(input.original.get("sizes"));
    let mut markup = String::from("<picture>");

    for format in input.formats.iter().filter(|f| *f != ORIGINAL_FORMAT) {
        let bucket = bucket(input.urls, format);
        if bucket.is_empty() {
            continue;
        }
        markup.push_str(&source_tag(mime_type(format), &bucket, sizes));
    }

    let original = bucket(input.urls, ORIGINAL_FORMAT);
    if !original.is_empty() {
        markup.push_str(&source_tag(None, &original, sizes));
    }

    markup.push_str(&fallback_img(input));
    markup.push_str("</picture>");
    markup
}

fn bucket<'a>(urls: &'a [GeneratedUrl], format: &str) -> Vec<&'a GeneratedUrl> {
    urls.iter().filter(|u| u.format == format).collect()
}

fn source_tag(mime: Option<&str>, urls: &[&GeneratedUrl], sizes: Option<&str>) -> String {
    let mut tag = String::from("<source");
    if let Some(mime) = mime {
        tag.push_str(&format!(" type=\"{}\"", mime));
    }
    let srcset = generate_srcset(urls.iter().copied());
    tag.push_str(&format!(" srcset=\"{}\"", escape_attribute_value(&srcset)));
    if let Some(sizes) = sizes {
        tag.push_str(&format!(" sizes=\"{}\"", escape_attribute_value(sizes)));
    }
    tag.push('>');
    tag
}

// src comes from the original-format bucket (tagged `original` or carrying
// the extracted extension), else from every URL
fn fallback_img(input: &BuildInput<'_>) -> String {
    let ext = input.record.get("ext").map(String::as_str).unwrap_or("jpg");
    let preferred: Vec<&str> = input
        .urls
        .iter()
        .filter(|u| u.format == ORIGINAL_FORMAT || u.format == ext)
        .map(|u| u.url.as_str())
        .collect();
    let candidates: Vec<&str> = if preferred.is_empty() {
        input.urls.iter().map(|u| u.url.as_str()).collect()
    } else {
        preferred
    };

    let src = select_default_src(input.widths, &candidates).or(input.original.get("src"));
    let loading = input.loading.map(|l| l.as_str());

    let attributes = preserve_attributes(input.original, &[("src", src), ("loading", loading)]);
    start_tag("img", &attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Loading;
    use crate::extractor::ExtractedRecord;
    use crate::generator::generate_urls;
    use crate::html::Attributes;

    fn record() -> ExtractedRecord {
        [
            ("basePath".to_string(), "https://cdn.example.com/images".to_string()),
            ("filename".to_string(), "hero".to_string()),
            ("ext".to_string(), "jpg".to_string()),
        ]
        .into()
    }

    fn formats(list: &[&str]) -> Vec<String> {
        list.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_hero_picture() {
        let record = record();
        let formats = formats(&["webp", "original"]);
        let urls = generate_urls("{basePath}/{filename}_{width}w.{format}", &record, &[400, 800], &formats);
        let original: Attributes = [("src", "https://cdn.example.com/images/hero.jpg"), ("alt", "Hero")]
            .into_iter()
            .collect();

        let html = build_picture(&BuildInput {
            urls: &urls,
            original: &original,
            widths: &[400, 800],
            formats: &formats,
            sizes: None,
            loading: None,
            record: &record,
        });

        assert_eq!(
            html,
            concat!(
                "<picture>",
                r#"<source type="image/webp" srcset="https://cdn.example.com/images/hero_400w.webp 400w, https://cdn.example.com/images/hero_800w.webp 800w">"#,
                r#"<source srcset="https://cdn.example.com/images/hero_400w.jpg 400w, https://cdn.example.com/images/hero_800w.jpg 800w">"#,
                r#"<img alt="Hero" src="https://cdn.example.com/images/hero_800w.jpg">"#,
                "</picture>"
            )
        );
    }

    #[test]
    fn test_source_order_follows_declaration() {
        let record = record();
        let formats = formats(&["original", "avif", "webp"]);
        let urls = generate_urls("/{filename}-{width}.{format}", &record, &[320, 640, 960], &formats);

        let html = build_picture(&BuildInput {
            urls: &urls,
            original: &Attributes::new(),
            widths: &[320, 640, 960],
            formats: &formats,
            sizes: Some("(max-width: 640px) 100vw, 50vw"),
            loading: Some(Loading::Lazy),
            record: &record,
        });

        let avif = html.find(r#"type="image/avif""#).unwrap();
        let webp = html.find(r#"type="image/webp""#).unwrap();
        let untyped = html.find(r#"<source srcset="/hero-320.jpg"#).unwrap();
        assert!(avif < webp && webp < untyped);
        assert_eq!(html.matches("sizes=\"(max-width: 640px) 100vw, 50vw\"").count(), 3);
        assert!(html.ends_with(r#"<img src="/hero-640.jpg" loading="lazy"></picture>"#));
    }

    #[test]
    fn test_unknown_format_has_no_type_and_fallback_uses_any_bucket() {
        let record: ExtractedRecord = [("filename".to_string(), "x".to_string())].into();
        let formats = formats(&["jxl"]);
        let urls = generate_urls("/{filename}-{width}.{format}", &record, &[100, 200], &formats);
        let original: Attributes = [("class", "c"), ("srcset", "old.jpg 1x")].into_iter().collect();

        let html = build_picture(&BuildInput {
            urls: &urls,
            original: &original,
            widths: &[100, 200],
            formats: &formats,
            sizes: None,
            loading: None,
            record: &record,
        });

        assert_eq!(
            html,
            r#"<picture><source srcset="/x-100.jxl 100w, /x-200.jxl 200w"><img class="c" src="/x-200.jxl"></picture>"#
        );
    }
}
