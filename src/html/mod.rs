//! Span-preserving HTML document
//!
//! The document keeps the original source text and an arena of elements
//! addressed by [`NodeId`], built from one tl parse. Replacing an element
//! records new markup for the span of its start tag; serialization splices
//! replacements into the untouched source, so everything that was not
//! replaced comes out byte-identical.

mod attributes;
mod parser;

pub use attributes::Attributes;

use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::TransformError;

/// Opaque handle to an element in a [`Document`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An element with its decoded attributes and its place in the tree
#[derive(Debug, Clone)]
pub struct Element {
    name: String,
    attributes: Attributes,
    span: Range<usize>,
    parent: Option<NodeId>,
    // Index among the parent's element children
    position: usize,
    children: Vec<NodeId>,
    has_text: bool,
}

impl Element {
    /// Lowercase tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Element children in document order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// No element children and no text
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && !self.has_text
    }

    /// Value of `src`, or the empty string when absent
    pub fn src(&self) -> &str {
        self.attr("src").unwrap_or("")
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|list| list.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// Parsed HTML document with pending replacements
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    elements: Vec<Element>,
    roots: Vec<NodeId>,
    images: Vec<NodeId>,
    replacements: BTreeMap<NodeId, String>,
}

impl Document {
    /// Parse `html`, enumerating every `<img>` in document order
    pub fn parse(html: &str) -> Result<Self, TransformError> {
        let tree = parser::build(html)?;
        // Arena ids follow document order
        let images = tree
            .elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.name == "img")
            .map(|(i, _)| NodeId(i))
            .collect();

        Ok(Self {
            source: html.to_string(),
            elements: tree.elements,
            roots: tree.roots,
            images,
            replacements: BTreeMap::new(),
        })
    }

    /// Image elements in document order
    pub fn images(&self) -> &[NodeId] {
        &self.images
    }

    pub fn element(&self, id: NodeId) -> &Element {
        &self.elements[id.0]
    }

    /// Original markup of the element's start tag
    pub fn raw(&self, id: NodeId) -> &str {
        &self.source[self.elements[id.0].span.clone()]
    }

    /// Walk from the element's parent up to the outermost element
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            document: self,
            next: self.element(id).parent,
        }
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let position = self.element(id).position.checked_sub(1)?;
        self.siblings(id).get(position).copied()
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.siblings(id).get(self.element(id).position + 1).copied()
    }

    // The element's own generation, itself included
    fn siblings(&self, id: NodeId) -> &[NodeId] {
        match self.element(id).parent {
            Some(parent) => &self.element(parent).children,
            None => &self.roots,
        }
    }

    /// Replace an element with freshly rendered markup.
    ///
    /// The markup is parsed before it is accepted so a broken rendering
    /// never reaches the output.
    pub fn replace(&mut self, id: NodeId, markup: String) -> Result<(), TransformError> {
        let fresh = Document::parse(&markup).map_err(|e| {
            TransformError::GenerationFailed(format!(
                "replacement for {} does not parse: {}",
                self.raw(id),
                e
            ))
        })?;
        if fresh.elements.is_empty() {
            return Err(TransformError::GenerationFailed(format!(
                "replacement for {} contains no element",
                self.raw(id)
            )));
        }

        self.replacements.insert(id, markup);
        Ok(())
    }

    /// Render the document, splicing in every replacement
    pub fn serialize(&self) -> String {
        let extra: usize = self.replacements.values().map(String::len).sum();
        let mut out = String::with_capacity(self.source.len() + extra);
        let mut cursor = 0;

        for (id, markup) in &self.replacements {
            let span = &self.elements[id.0].span;
            out.push_str(&self.source[cursor..span.start]);
            out.push_str(markup);
            cursor = span.end;
        }
        out.push_str(&self.source[cursor..]);

        out
    }
}

/// Iterator over an element's ancestors, innermost first
pub struct Ancestors<'a> {
    document: &'a Document,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = (NodeId, &'a Element);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let element = self.document.element(id);
        self.next = element.parent;
        Some((id, element))
    }
}
