//! Rule application engine
//!
//! Parses the document once, evaluates every rule's selector against it,
//! then walks the rules in order and replaces each matching image that no
//! earlier rule has claimed. Any unrecoverable fault discards the document
//! and returns a [`TransformResult::Failure`].

pub mod attributes;
pub mod picture;
pub mod srcset;

pub use picture::build_picture;
pub use srcset::build_srcset;

use std::collections::HashSet;
use std::time::Instant;

use log::{debug, trace};
use serde::{Serialize, Serializer};

use crate::config::{validate_with, Config, Loading, OutputKind, Rule};
use crate::error::{ErrorCode, TransformError};
use crate::extractor::{extract, ExtractedRecord};
use crate::generator::template::validate_template_data;
use crate::generator::{generate_urls, GeneratedUrl};
use crate::html::{Attributes, Document, NodeId};
use crate::selector::{BoundMatcher, CompiledSelector, CssMatcher, SelectorMatcher};

/// Images handled between two yields of [`Transformer::transform_async`]
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Everything a markup builder needs for one image
#[derive(Debug, Clone, Copy)]
pub struct BuildInput<'a> {
    pub urls: &'a [GeneratedUrl],
    pub original: &'a Attributes,
    pub widths: &'a [u32],
    /// Declared formats in order
    pub formats: &'a [String],
    pub sizes: Option<&'a str>,
    pub loading: Option<Loading>,
    pub record: &'a ExtractedRecord,
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformStats {
    pub images_found: usize,
    /// Distinct images replaced
    pub images_transformed: usize,
    /// Rules that replaced at least one image
    pub rules_applied: usize,
    pub processing_time_ms: u64,
}

impl TransformStats {
    fn failed(started: Instant) -> Self {
        Self {
            processing_time_ms: elapsed_ms(started),
            ..Self::default()
        }
    }
}

/// Terminal outcome of a run
#[derive(Debug, Clone, PartialEq)]
pub enum TransformResult {
    Success {
        html: String,
        stats: TransformStats,
    },
    Failure {
        code: ErrorCode,
        error: String,
        stats: TransformStats,
    },
}

impl TransformResult {
    fn from_error(error: TransformError, stats: TransformStats) -> Self {
        TransformResult::Failure {
            code: error.code(),
            error: error.to_string(),
            stats,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TransformResult::Success { .. })
    }

    pub fn html(&self) -> Option<&str> {
        match self {
            TransformResult::Success { html, .. } => Some(html.as_str()),
            TransformResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TransformResult::Success { .. } => None,
            TransformResult::Failure { error, .. } => Some(error.as_str()),
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            TransformResult::Success { .. } => None,
            TransformResult::Failure { code, .. } => Some(*code),
        }
    }

    pub fn stats(&self) -> &TransformStats {
        match self {
            TransformResult::Success { stats, .. } | TransformResult::Failure { stats, .. } => stats,
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
    stats: &'a TransformStats,
}

// {"success", "html"?, "error"?, "code"?, "stats"}
impl Serialize for TransformResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Envelope {
            success: self.is_success(),
            html: self.html(),
            error: self.error(),
            code: self.code(),
            stats: self.stats(),
        }
        .serialize(serializer)
    }
}

/// The engine, parameterized by its selector backend
pub struct Transformer {
    matcher: Box<dyn SelectorMatcher>,
    batch_size: usize,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(CssMatcher)
    }
}

impl Transformer {
    pub fn new(matcher: impl SelectorMatcher + 'static) -> Self {
        Self {
            matcher: Box::new(matcher),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Images per batch in the async variant (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn matcher(&self) -> &dyn SelectorMatcher {
        self.matcher.as_ref()
    }

    /// Validate `config`, then transform
    pub fn process(&self, html: &str, config: &Config) -> TransformResult {
        let started = Instant::now();
        match validate_with(config, self.matcher()).into_result() {
            Ok(()) => self.transform(html, &config.transforms),
            Err(e) => TransformResult::from_error(e, TransformStats::failed(started)),
        }
    }

    pub async fn process_async(&self, html: &str, config: &Config) -> TransformResult {
        let started = Instant::now();
        match validate_with(config, self.matcher()).into_result() {
            Ok(()) => self.transform_async(html, &config.transforms).await,
            Err(e) => TransformResult::from_error(e, TransformStats::failed(started)),
        }
    }

    /// Apply `rules` to `html` without validating them first
    pub fn transform(&self, html: &str, rules: &[Rule]) -> TransformResult {
        let started = Instant::now();

        let mut run = match Run::start(self.matcher(), html, rules) {
            Ok(run) => run,
            Err(e) => return TransformResult::from_error(e, TransformStats::failed(started)),
        };

        let images = run.document.images().to_vec();
        for index in 0..rules.len() {
            if let Err(e) = run.apply(index, &images) {
                return TransformResult::from_error(e, TransformStats::failed(started));
            }
            run.finish_rule(index);
        }

        run.finish(started)
    }

    /// Same algorithm as [`transform`](Self::transform), yielding to the
    /// runtime after every batch of images
    pub async fn transform_async(&self, html: &str, rules: &[Rule]) -> TransformResult {
        let started = Instant::now();

        let mut run = match Run::start(self.matcher(), html, rules) {
            Ok(run) => run,
            Err(e) => return TransformResult::from_error(e, TransformStats::failed(started)),
        };

        let images = run.document.images().to_vec();
        for index in 0..rules.len() {
            for batch in images.chunks(self.batch_size) {
                if let Err(e) = run.apply(index, batch) {
                    return TransformResult::from_error(e, TransformStats::failed(started));
                }
                tokio::task::yield_now().await;
            }
            run.finish_rule(index);
        }

        run.finish(started)
    }
}

/// State of one invocation
struct Run<'r> {
    rules: &'r [Rule],
    document: Document,
    /// Per rule; `None` when the selector was rejected
    selectors: Vec<Option<CompiledSelector>>,
    transformed: HashSet<NodeId>,
    /// Images replaced by the current rule
    rule_hits: usize,
    stats: TransformStats,
}

impl<'r> Run<'r> {
    fn start(matcher: &dyn SelectorMatcher, html: &str, rules: &'r [Rule]) -> Result<Self, TransformError> {
        let document = Document::parse(html)?;
        let selectors = compile_selectors(matcher.bind(&document).as_ref(), rules);

        debug!(
            "{} images, {} rules, {} selector backend",
            document.images().len(),
            rules.len(),
            matcher.name()
        );

        Ok(Self {
            rules,
            stats: TransformStats {
                images_found: document.images().len(),
                ..TransformStats::default()
            },
            document,
            selectors,
            transformed: HashSet::new(),
            rule_hits: 0,
        })
    }

    fn apply(&mut self, index: usize, images: &[NodeId]) -> Result<(), TransformError> {
        let Some(selector) = &self.selectors[index] else {
            return Ok(());
        };
        let rule = &self.rules[index];

        for &id in images {
            if self.transformed.contains(&id) || !selector.matches(id) {
                continue;
            }

            let Some(markup) = render(&self.document, id, rule)? else {
                trace!("rule {}: no record for {}", index, self.document.raw(id));
                continue;
            };

            self.document.replace(id, markup)?;
            self.transformed.insert(id);
            self.rule_hits += 1;
        }

        Ok(())
    }

    fn finish_rule(&mut self, index: usize) {
        if self.rule_hits > 0 {
            debug!("rule {} ({}): {} images", index, self.rules[index].selector, self.rule_hits);
            self.stats.images_transformed += self.rule_hits;
            self.stats.rules_applied += 1;
        }
        self.rule_hits = 0;
    }

    fn finish(self, started: Instant) -> TransformResult {
        let html = self.document.serialize();
        let stats = TransformStats {
            processing_time_ms: elapsed_ms(started),
            ..self.stats
        };

        debug!(
            "transformed {}/{} images in {}ms",
            stats.images_transformed, stats.images_found, stats.processing_time_ms
        );

        TransformResult::Success { html, stats }
    }
}

// Selectors see the document as parsed, before any replacement
fn compile_selectors(bound: &dyn BoundMatcher, rules: &[Rule]) -> Vec<Option<CompiledSelector>> {
    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| match bound.compile(&rule.selector) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                debug!("rule {} skipped: {}", index, e);
                None
            }
        })
        .collect()
}

/// Replacement markup for one image, or `None` when extraction finds nothing
fn render(document: &Document, id: NodeId, rule: &Rule) -> Result<Option<String>, TransformError> {
    let element = document.element(id);
    let Some(record) = extract(element.src(), &rule.extract)? else {
        return Ok(None);
    };

    let check = validate_template_data(&rule.url_template, &record);
    if !check.valid {
        debug!(
            "{}: placeholders without data stay literal: {}",
            element.src(),
            check.missing.join(", ")
        );
    }

    let formats = rule.effective_formats();
    let urls = generate_urls(&rule.url_template, &record, &rule.widths, &formats);
    let input = BuildInput {
        urls: &urls,
        original: element.attributes(),
        widths: &rule.widths,
        formats: &formats,
        sizes: rule.sizes.as_deref(),
        loading: rule.loading,
        record: &record,
    };

    let markup = match rule.output {
        OutputKind::Picture => build_picture(&input),
        OutputKind::Srcset => build_srcset(&input),
    };
    Ok(Some(markup))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
