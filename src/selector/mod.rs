//! Selector matching strategies
//!
//! The engine talks to a [`SelectorMatcher`], never to a concrete CSS
//! implementation. A matcher is bound to one [`Document`] and then compiles
//! each rule's selector into the set of images it selects:
//!
//! - [`CssMatcher`]: full CSS via the scraper crate (default)
//! - [`SimpleMatcher`]: hand-written matcher for a reduced selector subset

mod css;
mod simple;

pub use css::CssMatcher;
pub use simple::{parse_selector, AttributeOp, AttributePredicate, Combinator, Compound, ParsedSelector, SimpleMatcher};

use std::collections::HashSet;

use crate::error::TransformError;
use crate::html::{Document, NodeId};

/// Selector backend injected into the engine
pub trait SelectorMatcher: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Reject selectors this backend cannot parse
    fn check(&self, selector: &str) -> Result<(), TransformError>;

    /// Prepare matching against `document`
    fn bind<'d>(&self, document: &'d Document) -> Box<dyn BoundMatcher + 'd>;
}

/// A matcher bound to one document
pub trait BoundMatcher {
    /// Evaluate `selector` against every image of the document
    fn compile(&self, selector: &str) -> Result<CompiledSelector, TransformError>;
}

/// Images selected by one selector
#[derive(Debug, Clone, Default)]
pub struct CompiledSelector {
    matched: HashSet<NodeId>,
}

impl CompiledSelector {
    pub fn matches(&self, node: NodeId) -> bool {
        self.matched.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.matched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

impl FromIterator<NodeId> for CompiledSelector {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            matched: iter.into_iter().collect(),
        }
    }
}

/// Does `node` satisfy `selector`?
pub fn matches(bound: &dyn BoundMatcher, node: NodeId, selector: &str) -> Result<bool, TransformError> {
    Ok(bound.compile(selector)?.matches(node))
}

/// Syntax check with the default CSS backend
pub fn is_valid_selector(selector: &str) -> bool {
    CssMatcher.check(selector).is_ok()
}

/// Forms no backend accepts: empty, a leading `>`, or the `>>>` shorthand
pub(crate) fn reject_always_invalid(selector: &str) -> Result<(), TransformError> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(TransformError::selector(selector, "empty selector"));
    }
    if trimmed.starts_with('>') {
        return Err(TransformError::selector(selector, "leading combinator"));
    }
    if trimmed.contains(">>>") {
        return Err(TransformError::selector(selector, "unsupported '>>>' combinator"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_invalid_forms() {
        for selector in ["", "   ", "> img", "div >>> img"] {
            assert!(reject_always_invalid(selector).is_err(), "{:?}", selector);
            assert!(!is_valid_selector(selector), "{:?}", selector);
        }
        assert!(is_valid_selector("article > figure img.hero"));
        assert!(!is_valid_selector("img["));
        assert!(!is_valid_selector("img[=x]"));
    }

    #[test]
    fn test_backends_agree_on_supported_subset() {
        let html = r#"<main id="content">
            <figure class="wide"><img class="hero responsive" src="a.jpg" data-kind="cover-photo"></figure>
            <p><img src="b.jpg" alt=""></p>
            <img id="logo" src="c.png">
        </main>"#;
        let doc = Document::parse(html).unwrap();
        let selectors = [
            "img",
            ".hero",
            ".hero.responsive",
            "#logo",
            "img[alt]",
            r#"img[src="b.jpg"]"#,
            r#"img[data-kind*="cover"]"#,
            "figure img",
            "main > img",
            "p > img.hero",
        ];

        let css = CssMatcher.bind(&doc);
        let simple = SimpleMatcher.bind(&doc);
        for selector in selectors {
            for &img in doc.images() {
                assert_eq!(
                    matches(css.as_ref(), img, selector).unwrap(),
                    matches(simple.as_ref(), img, selector).unwrap(),
                    "{} on {}",
                    selector,
                    doc.raw(img)
                );
            }
        }
    }

    #[test]
    fn test_compiled_selector_set() {
        let doc = Document::parse(r#"<img class="a" src="1.jpg"><img src="2.jpg">"#).unwrap();
        let bound = SimpleMatcher.bind(&doc);
        let compiled = bound.compile(".a").unwrap();

        assert_eq!(compiled.len(), 1);
        assert!(compiled.matches(doc.images()[0]));
        assert!(!compiled.matches(doc.images()[1]));
    }
}
