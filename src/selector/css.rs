//! Native CSS matching
//!
//! Selectors are parsed with scraper's selector grammar and evaluated by the
//! `selectors` engine directly against the document's element arena, so
//! combinators and pseudo-classes see exactly the tree the engine rewrites.

use std::fmt;

use cssparser::ParserInput;
use scraper::error::SelectorErrorKind;
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, Parser as Grammar, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{
    matches_selector_list, ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode,
    NeedsSelectorFlags, QuirksMode, SelectorCaches,
};
use selectors::parser::{ParseRelative, SelectorImpl, SelectorList};
use selectors::{Element as SelectorElement, OpaqueElement};

use super::{reject_always_invalid, BoundMatcher, CompiledSelector, SelectorMatcher};
use crate::error::TransformError;
use crate::html::{Document, Element, NodeId};

type Namespace = <Simple as SelectorImpl>::NamespaceUrl;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Full CSS selector support (default backend)
#[derive(Debug, Clone, Copy, Default)]
pub struct CssMatcher;

impl SelectorMatcher for CssMatcher {
    fn name(&self) -> &'static str {
        "css"
    }

    fn check(&self, selector: &str) -> Result<(), TransformError> {
        parse(selector).map(|_| ())
    }

    fn bind<'d>(&self, document: &'d Document) -> Box<dyn BoundMatcher + 'd> {
        Box::new(BoundCss { document })
    }
}

struct BoundCss<'d> {
    document: &'d Document,
}

impl BoundMatcher for BoundCss<'_> {
    fn compile(&self, selector: &str) -> Result<CompiledSelector, TransformError> {
        let list = parse(selector)?;
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut caches,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );

        Ok(self
            .document
            .images()
            .iter()
            .copied()
            .filter(|&id| {
                let node = Node {
                    document: self.document,
                    id,
                };
                matches_selector_list(&list, &node, &mut context)
            })
            .collect())
    }
}

fn parse(selector: &str) -> Result<SelectorList<Simple>, TransformError> {
    reject_always_invalid(selector)?;
    let mut input = ParserInput::new(selector);
    let mut parser = cssparser::Parser::new(&mut input);
    SelectorList::parse(&Grammar, &mut parser, ParseRelative::No)
        .map_err(|e| TransformError::selector(selector, SelectorErrorKind::from(e).to_string()))
}

/// An arena element as seen by the selector engine
#[derive(Clone, Copy)]
struct Node<'d> {
    document: &'d Document,
    id: NodeId,
}

impl<'d> Node<'d> {
    fn at(&self, id: NodeId) -> Self {
        Self {
            document: self.document,
            id,
        }
    }

    fn element(&self) -> &'d Element {
        self.document.element(self.id)
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.document.raw(self.id))
    }
}

impl SelectorElement for Node<'_> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.element())
    }

    fn parent_element(&self) -> Option<Self> {
        self.element().parent().map(|id| self.at(id))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.document.prev_sibling(self.id).map(|id| self.at(id))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.document.next_sibling(self.id).map(|id| self.at(id))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.element().children().first().map(|&id| self.at(id))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &CssLocalName) -> bool {
        self.element().name() == &*name.0
    }

    fn has_namespace(&self, namespace: &Namespace) -> bool {
        &**namespace == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.element().name() == other.element().name()
    }

    fn attr_matches(
        &self,
        namespace: &NamespaceConstraint<&Namespace>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        // Parsed attributes never carry a namespace
        if let NamespaceConstraint::Specific(url) = namespace {
            if !url.is_empty() {
                return false;
            }
        }
        self.element()
            .attributes()
            .iter()
            .any(|(key, value)| key == &*local_name.0 && operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Simple>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(&self, _pe: &PseudoElement, _context: &mut MatchingContext<'_, Simple>) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.element().name(), "a" | "area" | "link") && self.element().attributes().contains("href")
    }

    fn is_html_slot_element(&self) -> bool {
        self.element().name() == "slot"
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.element()
            .attr("id")
            .is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.element().attr("class").is_some_and(|list| {
            list.split_ascii_whitespace()
                .any(|class| case_sensitivity.eq(name.0.as_bytes(), class.as_bytes()))
        })
    }

    fn has_custom_state(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.element().is_empty()
    }

    fn is_root(&self) -> bool {
        self.element().parent().is_none() && self.element().name() == "html"
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_check() {
        assert!(CssMatcher.check("img:not(.skip)").is_ok());
        assert!(CssMatcher.check("figure:first-child > img").is_ok());

        let err = CssMatcher.check("img[").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SelectorError);
        assert!(CssMatcher.check("img[=x]").is_err());
        assert!(CssMatcher.check("> img").is_err());
    }

    #[test]
    fn test_pseudo_classes_and_combinators() {
        let html = r#"<section><img src="a.jpg" class="skip"><img src="b.jpg"></section>
            <aside><img src="c.jpg"></aside>"#;
        let doc = Document::parse(html).unwrap();
        let bound = CssMatcher.bind(&doc);

        let compiled = bound.compile("section img:not(.skip)").unwrap();
        let ids = doc.images();
        assert!(!compiled.matches(ids[0]));
        assert!(compiled.matches(ids[1]));
        assert!(!compiled.matches(ids[2]));

        let compiled = bound.compile("aside > img, .skip").unwrap();
        assert_eq!(compiled.len(), 2);

        let compiled = bound.compile("img:first-child").unwrap();
        assert!(compiled.matches(ids[0]));
        assert!(!compiled.matches(ids[1]));
        assert!(compiled.matches(ids[2]));

        let compiled = bound.compile("section + aside img, img + img").unwrap();
        assert!(!compiled.matches(ids[0]));
        assert!(compiled.matches(ids[1]));
        assert!(compiled.matches(ids[2]));
    }

    #[test]
    fn test_combinators_next_to_unknown_elements() {
        // <image> is not an image element and must not disturb matching
        let html = r#"<figure><img src="/a/one.jpg"></figure><div><img class="hero" src="a.jpg"><image src="/legacy.svg"></div>"#;
        let doc = Document::parse(html).unwrap();
        assert_eq!(doc.images().len(), 2);

        let bound = CssMatcher.bind(&doc);
        let compiled = bound.compile("figure img").unwrap();
        assert!(compiled.matches(doc.images()[0]));
        assert_eq!(compiled.len(), 1);

        let compiled = bound.compile("div > img.hero").unwrap();
        assert!(compiled.matches(doc.images()[1]));
        assert_eq!(compiled.len(), 1);
    }

    #[test]
    fn test_attribute_operators() {
        let doc = Document::parse(r#"<img src="/cdn/a.webp" data-role="hero banner" alt="">"#).unwrap();
        let bound = CssMatcher.bind(&doc);
        let img = doc.images()[0];

        for selector in [
            r#"img[src^="/cdn"]"#,
            r#"img[src$=".webp"]"#,
            r#"img[data-role~="banner"]"#,
            "img[alt]",
            r#"img[src*="a.w"]"#,
        ] {
            assert!(bound.compile(selector).unwrap().matches(img), "{}", selector);
        }
        assert!(bound.compile("img[title]").unwrap().is_empty());
    }
}
