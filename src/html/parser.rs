//! Arena construction on top of tl
//!
//! tl parses the document into its own node arena without copying the input.
//! That arena is walked once to build ours: every element with its lowercase
//! name, its attributes in source order and the byte span of its start tag.
//! Spans come from where tl's slices sit inside the source string.

use std::borrow::Cow;
use std::ops::Range;

use tl::{HTMLTag, Node, NodeHandle, Parser, ParserOptions};

use super::{Attributes, Element, NodeId};
use crate::error::TransformError;

// Content is text, never markup
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes", "noscript",
];

pub(super) struct Tree {
    pub(super) elements: Vec<Element>,
    pub(super) roots: Vec<NodeId>,
}

pub(super) fn build(source: &str) -> Result<Tree, TransformError> {
    let dom = tl::parse(source, ParserOptions::default())
        .map_err(|e| TransformError::InvalidHtml(format!("{:?}", e)))?;
    let parser = dom.parser();

    let mut builder = Builder {
        source,
        elements: Vec::new(),
    };
    let roots = builder.visit_children(dom.children().iter().copied(), parser, None)?;

    Ok(Tree {
        elements: builder.elements,
        roots,
    })
}

struct Builder<'s> {
    source: &'s str,
    elements: Vec<Element>,
}

impl Builder<'_> {
    fn visit_children(
        &mut self,
        handles: impl IntoIterator<Item = NodeHandle>,
        parser: &Parser,
        parent: Option<NodeId>,
    ) -> Result<Vec<NodeId>, TransformError> {
        let mut children = Vec::new();
        for handle in handles {
            match handle.get(parser) {
                Some(Node::Tag(tag)) => {
                    let id = self.visit_tag(tag, parser, parent, children.len())?;
                    children.push(id);
                }
                Some(Node::Raw(text)) => {
                    if let Some(parent) = parent {
                        self.elements[parent.0].has_text |= !text.as_bytes().is_empty();
                    }
                }
                _ => {}
            }
        }
        Ok(children)
    }

    fn visit_tag(
        &mut self,
        tag: &HTMLTag,
        parser: &Parser,
        parent: Option<NodeId>,
        position: usize,
    ) -> Result<NodeId, TransformError> {
        let name = tag.name().as_utf8_str().to_ascii_lowercase();
        let span = self.start_tag_span(tag, &name)?;
        let attributes = self.attributes(tag, &span);
        let handles: Vec<NodeHandle> = tag.children().top().iter().copied().collect();

        let id = NodeId(self.elements.len());
        self.elements.push(Element {
            name,
            attributes,
            span,
            parent,
            position,
            children: Vec::new(),
            has_text: false,
        });

        if RAW_TEXT_ELEMENTS.contains(&self.elements[id.0].name.as_str()) {
            self.elements[id.0].has_text = !handles.is_empty();
        } else {
            let children = self.visit_children(handles, parser, Some(id))?;
            self.elements[id.0].children = children;
        }

        Ok(id)
    }

    /// Byte range of the tag's opening markup. A `<` outside quotes or a tag
    /// running to end of input is fatal for `<img>` only.
    fn start_tag_span(&self, tag: &HTMLTag, name: &str) -> Result<Range<usize>, TransformError> {
        let start = self
            .offset_of(tag.raw().as_bytes())
            .filter(|&start| self.source[start..].starts_with('<'))
            .ok_or_else(|| TransformError::InvalidHtml(format!("<{}> tag could not be located", name)))?;

        let (end, garbled) = scan_start_tag(&self.source[start..]);
        if name == "img" {
            if garbled {
                return Err(TransformError::InvalidHtml(
                    "Malformed img tag with unclosed attributes".to_string(),
                ));
            }
            if end.is_none() {
                return Err(TransformError::InvalidHtml(format!(
                    "unterminated <img> tag at byte {}",
                    start
                )));
            }
        }

        Ok(start..end.map_or(self.source.len(), |len| start + len))
    }

    fn attributes(&self, tag: &HTMLTag, span: &Range<usize>) -> Attributes {
        let mut found: Vec<(usize, String, String)> = tag
            .attributes()
            .iter()
            .map(|(key, value)| {
                // tl may not keep attribute order; its slices still point
                // into the source, which does
                let at = self
                    .position_in(&key, span)
                    .or_else(|| value.as_deref().and_then(|v| self.position_in(v, span)))
                    .unwrap_or(usize::MAX);
                let value = value.map(|v| decode(&v).into_owned()).unwrap_or_default();
                (at, key.to_ascii_lowercase(), value)
            })
            .collect();
        found.sort_by_key(|(at, _, _)| *at);

        found.into_iter().map(|(_, key, value)| (key, value)).collect()
    }

    fn position_in(&self, text: &str, span: &Range<usize>) -> Option<usize> {
        self.offset_of(text.as_bytes()).filter(|at| span.contains(at))
    }

    /// Where `bytes` starts within the source, if it is a slice of it
    fn offset_of(&self, bytes: &[u8]) -> Option<usize> {
        if bytes.is_empty() {
            return None;
        }
        let at = (bytes.as_ptr() as usize).checked_sub(self.source.as_ptr() as usize)?;
        (at + bytes.len() <= self.source.len()).then_some(at)
    }
}

/// Length of the start tag at the head of `markup`, up to and including the
/// first `>` outside a quoted value, and whether a `<` appeared unquoted.
fn scan_start_tag(markup: &str) -> (Option<usize>, bool) {
    let mut quote = None;
    let mut after_equals = false;
    let mut garbled = false;

    for (i, c) in markup.char_indices().skip(1) {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => continue,
            None => match c {
                '"' | '\'' if after_equals => {
                    quote = Some(c);
                    continue;
                }
                '>' => return (Some(i + 1), garbled),
                '<' => garbled = true,
                _ => {}
            },
        }
        if !c.is_whitespace() {
            after_equals = c == '=';
        }
    }

    (None, garbled)
}

/// Resolve character references; values with references that cannot be
/// resolved are kept verbatim
fn decode(value: &str) -> Cow<'_, str> {
    quick_xml::escape::unescape(value).unwrap_or(Cow::Borrowed(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(html: &str) -> Vec<String> {
        build(html)
            .unwrap()
            .elements
            .into_iter()
            .map(|el| el.name)
            .collect()
    }

    #[test]
    fn test_skips_comments_and_raw_text() {
        let html = r#"<!-- <img src="a"> --><noscript><img src='b'></noscript><style>img{}</style><img src="c">"#;
        let names = names(html);
        assert_eq!(names.iter().filter(|n| *n == "img").count(), 1);
        assert!(names.contains(&"noscript".to_string()));
    }

    #[test]
    fn test_quoted_values_may_contain_angle_brackets() {
        let html = r#"<img alt="a > b" src='x.jpg' title=plain>"#;
        let tree = build(html).unwrap();
        let img = &tree.elements[0];
        assert_eq!(img.span, 0..html.len());
        assert_eq!(img.attributes.get("alt"), Some("a > b"));
        assert_eq!(img.attributes.get("src"), Some("x.jpg"));
        assert_eq!(img.attributes.get("title"), Some("plain"));
    }

    #[test]
    fn test_attributes_keep_source_order() {
        let tree = build(r#"<img data-z="1" class="c" src="a.jpg" ID="main" alt="" loading>"#).unwrap();
        let attrs = &tree.elements[0].attributes;

        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["data-z", "class", "src", "id", "alt", "loading"]);
        assert_eq!(attrs.get("loading"), Some(""));
    }

    #[test]
    fn test_parent_and_position() {
        let tree = build("<div><span></span><img src=a></div><img src=b>").unwrap();
        let names: Vec<&str> = tree.elements.iter().map(|el| el.name.as_str()).collect();
        assert_eq!(names, vec!["div", "span", "img", "img"]);

        assert_eq!(tree.elements[2].parent, Some(NodeId(0)));
        assert_eq!(tree.elements[2].position, 1);
        assert_eq!(tree.elements[3].parent, None);
        assert_eq!(tree.roots, vec![NodeId(0), NodeId(3)]);
    }

    #[test]
    fn test_malformed_img_is_rejected() {
        let err = build(r#"<img src="test.jpg" <div>broken</div>"#).err().unwrap();
        assert!(err.to_string().contains("Malformed img tag"));
    }

    #[test]
    fn test_scan_start_tag() {
        assert_eq!(scan_start_tag(r#"<img alt="1 > 0" src=x>tail"#), (Some(23), false));
        assert_eq!(scan_start_tag(r#"<img alt=don't>"#), (Some(15), false));
        assert_eq!(scan_start_tag(r#"<img src="a" <b>"#), (Some(16), true));
        assert_eq!(scan_start_tag(r#"<img src="a"#), (None, false));
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode("a.jpg?w=1&amp;h=2"), "a.jpg?w=1&h=2");
        assert_eq!(decode("&#60;&#x3E;&quot;"), "<>\"");
        assert_eq!(decode("fish &nbsp; chips"), "fish &nbsp; chips");
    }
}
