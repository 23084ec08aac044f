//! Reduced hand-written selector matcher
//!
//! Supports type selectors, `#id`, compound `.class` lists and bracketed
//! attribute predicates (`[attr]`, `[attr="v"]`, `[attr*="v"]`), joined by
//! descendant or child combinators. Any other syntax parses to "unsupported"
//! and matches nothing.

use log::debug;

use super::{reject_always_invalid, BoundMatcher, CompiledSelector, SelectorMatcher};
use crate::error::TransformError;
use crate::html::{Document, Element, NodeId};

#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleMatcher;

impl SelectorMatcher for SimpleMatcher {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn check(&self, selector: &str) -> Result<(), TransformError> {
        reject_always_invalid(selector)
    }

    fn bind<'d>(&self, document: &'d Document) -> Box<dyn BoundMatcher + 'd> {
        Box::new(BoundSimple { document })
    }
}

struct BoundSimple<'d> {
    document: &'d Document,
}

impl BoundMatcher for BoundSimple<'_> {
    fn compile(&self, selector: &str) -> Result<CompiledSelector, TransformError> {
        let Some(parsed) = parse_selector(selector)? else {
            debug!("simple matcher: unsupported selector {:?}, matching nothing", selector);
            return Ok(CompiledSelector::default());
        };

        Ok(self
            .document
            .images()
            .iter()
            .copied()
            .filter(|id| parsed.matches(self.document, *id))
            .collect())
    }
}

/// How two compounds are related
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOp {
    Exists,
    Equals(String),
    Contains(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePredicate {
    pub name: String,
    pub op: AttributeOp,
}

impl AttributePredicate {
    fn matches(&self, element: &Element) -> bool {
        let Some(value) = element.attr(&self.name) else {
            return false;
        };
        match &self.op {
            AttributeOp::Exists => true,
            AttributeOp::Equals(expected) => value == expected,
            AttributeOp::Contains(needle) => !needle.is_empty() && value.contains(needle.as_str()),
        }
    }
}

/// Simple selectors that must all hold for one element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// Lowercase tag name, `*` for any
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributePredicate>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attributes.is_empty()
    }

    pub fn matches(&self, element: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if tag != "*" && tag != element.name() {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|class| element.has_class(class))
            && self.attributes.iter().all(|attr| attr.matches(element))
    }
}

/// Compounds joined by combinators, left to right
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

impl ParsedSelector {
    pub fn compounds(&self) -> &[Compound] {
        &self.compounds
    }

    pub fn combinators(&self) -> &[Combinator] {
        &self.combinators
    }

    /// Match right to left, walking ancestors for the structural part
    pub fn matches(&self, document: &Document, node: NodeId) -> bool {
        match self.compounds.len() {
            0 => false,
            n => self.matches_at(document, node, n - 1),
        }
    }

    fn matches_at(&self, document: &Document, node: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(document.element(node)) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => document
                .element(node)
                .parent()
                .map(|parent| self.matches_at(document, parent, index - 1))
                .unwrap_or(false),
            Combinator::Descendant => document
                .ancestors(node)
                .any(|(ancestor, _)| self.matches_at(document, ancestor, index - 1)),
        }
    }
}

/// Parse a selector for the reduced matcher.
///
/// Always-invalid forms are an error; syntax outside the supported subset
/// yields `Ok(None)`.
pub fn parse_selector(selector: &str) -> Result<Option<ParsedSelector>, TransformError> {
    reject_always_invalid(selector)?;
    Ok(SelectorParser::new(selector.trim()).parse())
}

struct SelectorParser {
    chars: Vec<char>,
    pos: usize,
}

impl SelectorParser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse(mut self) -> Option<ParsedSelector> {
        let mut compounds = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let spaced = self.skip_whitespace();
            let combinator = match self.peek() {
                None => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if spaced => Combinator::Descendant,
                Some(_) => return None,
            };
            combinators.push(combinator);
            compounds.push(self.compound()?);
        }

        Some(ParsedSelector {
            compounds,
            combinators,
        })
    }

    fn compound(&mut self) -> Option<Compound> {
        let mut compound = Compound::default();

        if self.peek() == Some('*') {
            self.pos += 1;
            compound.tag = Some("*".to_string());
        } else if let Some(tag) = self.ident() {
            compound.tag = Some(tag.to_ascii_lowercase());
        }

        loop {
            match self.peek() {
                Some('#') if compound.id.is_none() => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.attribute()?);
                }
                _ => break,
            }
        }

        if compound.is_empty() {
            None
        } else {
            Some(compound)
        }
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
        {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        Some(self.chars[start..self.pos].iter().collect())
    }

    fn attribute(&mut self) -> Option<AttributePredicate> {
        self.skip_whitespace();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let contains = match self.peek()? {
            ']' => {
                self.pos += 1;
                return Some(AttributePredicate {
                    name,
                    op: AttributeOp::Exists,
                });
            }
            '=' => {
                self.pos += 1;
                false
            }
            '*' if self.peek_at(1) == Some('=') => {
                self.pos += 2;
                true
            }
            _ => return None,
        };

        self.skip_whitespace();
        let value = self.value()?;
        self.skip_whitespace();
        if self.peek()? != ']' {
            return None;
        }
        self.pos += 1;

        let op = if contains {
            AttributeOp::Contains(value)
        } else {
            AttributeOp::Equals(value)
        };
        Some(AttributePredicate { name, op })
    }

    fn value(&mut self) -> Option<String> {
        match self.peek()? {
            quote @ ('"' | '\'') => {
                self.pos += 1;
                let start = self.pos;
                while self.peek()? != quote {
                    self.pos += 1;
                }
                let value = self.chars[start..self.pos].iter().collect();
                self.pos += 1;
                Some(value)
            }
            _ => self.ident(),
        }
    }
}
