//! The template engine: resolve placeholders and rewrite host trees.
//!
//! A pass walks the tree depth-first in document order and visits every node
//! once. For each text node and each attribute value holding at least one
//! placeholder, every `{{ path | filter ... }}` is resolved against the
//! engine's [`Context`], piped through the named filters, and the rewritten
//! string is stored back. Content without a placeholder is never written.
//!
//! Resolution degrades instead of failing:
//!
//! | situation                      | outcome                              |
//! |--------------------------------|--------------------------------------|
//! | path missing from the context  | empty string, filters still run      |
//! | filter name not registered     | stage skipped, value unchanged       |
//! | filter errors or panics        | whole placeholder renders as `""`    |
//!
//! Only the last case is logged at `warn`; misses are logged at `debug`.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{MaskError, Result};
use crate::expression::Expression;
use crate::placeholder::render_with;
use crate::registry::{FilterFn, FilterRegistry};
use crate::tree::HostNode;
use crate::value::to_display_string;

/// Whether a pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Scanning,
}

/// Something that resolved to a default instead of a real value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    /// The data path was not found; the value started out as `""`.
    Path(String),
    /// The filter is not registered; its stage was skipped.
    Filter(String),
}

/// Result of evaluating one expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: Value,
    pub misses: Vec<Miss>,
}

impl Evaluation {
    /// True when the path resolved and every filter was found.
    pub fn is_complete(&self) -> bool {
        self.misses.is_empty()
    }

    pub fn to_display_string(&self) -> String {
        to_display_string(&self.value)
    }
}

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub nodes_visited: usize,
    pub placeholders: usize,
    pub text_rewrites: usize,
    pub attribute_rewrites: usize,
    /// Placeholders that hit an evaluation fault and rendered as `""`.
    pub faults: usize,
}

impl ScanReport {
    pub fn rewrites(&self) -> usize {
        self.text_rewrites + self.attribute_rewrites
    }
}

/// Resolves placeholder expressions and rewrites trees.
///
/// The engine owns its context and filters. It is `Send + Sync`: passes take
/// `&self` plus exclusive access to the tree, while registering filters or
/// editing the context takes `&mut self`.
#[derive(Debug)]
pub struct TemplateEngine {
    context: Context,
    filters: FilterRegistry,
    ready_fired: AtomicBool,
    /// Passes currently running.
    active_passes: AtomicUsize,
}

impl TemplateEngine {
    /// An engine over `context` with the default registry (`mask` only).
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use mask_core::{Context, TemplateEngine};
    ///
    /// let mut ctx = Context::new();
    /// ctx.insert("phone", json!("_mask|GM|bm9uY2U|ZW5j|bWFj|138****5678"));
    /// let engine = TemplateEngine::new(ctx);
    ///
    /// assert_eq!(engine.resolve("phone | mask"), "138****5678");
    /// assert_eq!(engine.resolve("missing.path"), "");
    /// ```
    pub fn new(context: Context) -> Self {
        Self::with_registry(context, FilterRegistry::new())
    }

    pub fn with_registry(context: Context, filters: FilterRegistry) -> Self {
        Self {
            context,
            filters,
            ready_fired: AtomicBool::new(false),
            active_passes: AtomicUsize::new(0),
        }
    }

    /// See [`FilterRegistry::register`].
    pub fn register_filter<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.filters.register(name, filter);
    }

    /// See [`FilterRegistry::register_fallible`].
    pub fn register_fallible_filter<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.filters.register_fallible(name, filter);
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn filters_mut(&mut self) -> &mut FilterRegistry {
        &mut self.filters
    }

    pub fn state(&self) -> EngineState {
        if self.active_passes.load(Ordering::Acquire) > 0 {
            EngineState::Scanning
        } else {
            EngineState::Idle
        }
    }

    /// Evaluate an expression, reporting misses explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`MaskError::Filter`] or [`MaskError::FilterPanicked`] when a
    /// filter fails. Missing paths and unknown filters are not errors; they
    /// are listed in [`Evaluation::misses`].
    pub fn evaluate(&self, source: &str) -> Result<Evaluation> {
        let expression = Expression::parse(source);
        let mut misses = Vec::new();

        let mut value = match self.context.lookup(&expression.data_path()) {
            Some(found) => found.clone(),
            None => {
                misses.push(Miss::Path(expression.path().to_string()));
                Value::String(String::new())
            }
        };

        for name in expression.filters() {
            match self.filters.get(name) {
                Some(filter) => value = run_filter(name, filter, &value)?,
                None => misses.push(Miss::Filter(name.to_string())),
            }
        }

        Ok(Evaluation { value, misses })
    }

    /// Resolve an expression to display text. Never fails; a faulting
    /// expression renders as `""`.
    pub fn resolve(&self, source: &str) -> String {
        self.resolve_counted(source).unwrap_or_default()
    }

    /// Render every placeholder in `template`. Text without placeholders is
    /// returned unchanged.
    pub fn render(&self, template: &str) -> String {
        self.render_str(template)
            .unwrap_or_else(|| template.to_string())
    }

    /// Like [`TemplateEngine::render`], but `None` when there was nothing to
    /// replace.
    pub fn render_str(&self, template: &str) -> Option<String> {
        render_with(template, |body| self.resolve(body))
    }

    /// Run a pass now. Usable at any time, e.g. after the tree was mutated;
    /// the engine does not observe trees between passes.
    pub fn scan_now<N: HostNode>(&self, root: &mut N) -> ScanReport {
        let report = {
            let _pass = PassGuard::enter(&self.active_passes);
            let mut report = ScanReport::default();
            self.visit(root, &mut report);
            report
        };

        debug!(
            nodes = report.nodes_visited,
            placeholders = report.placeholders,
            rewrites = report.rewrites(),
            faults = report.faults,
            "Template scan completed"
        );
        report
    }

    /// The tree-ready signal. Runs a pass the first time it is called and
    /// returns `None` afterwards; use [`TemplateEngine::scan_now`] to rescan.
    pub fn on_ready<N: HostNode>(&self, root: &mut N) -> Option<ScanReport> {
        if self.ready_fired.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(self.scan_now(root))
    }

    pub fn ready_fired(&self) -> bool {
        self.ready_fired.load(Ordering::Acquire)
    }

    fn visit<N: HostNode>(&self, node: &mut N, report: &mut ScanReport) {
        report.nodes_visited += 1;

        let rendered = node
            .text()
            .and_then(|text| self.render_counted(text, report));
        if let Some(text) = rendered {
            node.set_text(text);
            report.text_rewrites += 1;
        }

        for name in node.attribute_names() {
            let rendered = node
                .attribute(&name)
                .and_then(|value| self.render_counted(value, report));
            if let Some(value) = rendered {
                node.set_attribute(&name, value);
                report.attribute_rewrites += 1;
            }
        }

        for child in node.children_mut() {
            self.visit(child, report);
        }
    }

    fn render_counted(&self, input: &str, report: &mut ScanReport) -> Option<String> {
        render_with(input, |body| {
            report.placeholders += 1;
            self.resolve_counted(body).unwrap_or_else(|| {
                report.faults += 1;
                String::new()
            })
        })
    }

    /// `None` on an evaluation fault, after logging it.
    fn resolve_counted(&self, source: &str) -> Option<String> {
        match self.evaluate(source) {
            Ok(evaluation) => {
                for miss in &evaluation.misses {
                    match miss {
                        Miss::Path(path) => debug!(path = %path, "Data path not found"),
                        Miss::Filter(name) => debug!(filter = %name, "Unknown filter skipped"),
                    }
                }
                Some(evaluation.to_display_string())
            }
            Err(e) => {
                warn!(expression = %source.trim(), error = %e, "Failed to evaluate placeholder");
                None
            }
        }
    }
}

/// Counts a pass as active until dropped, including on unwind.
struct PassGuard<'a> {
    active: &'a AtomicUsize,
}

impl<'a> PassGuard<'a> {
    fn enter(active: &'a AtomicUsize) -> Self {
        active.fetch_add(1, Ordering::AcqRel);
        Self { active }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

fn run_filter(name: &str, filter: &FilterFn, value: &Value) -> Result<Value> {
    match catch_unwind(AssertUnwindSafe(|| filter(value))) {
        Ok(Ok(next)) => Ok(next),
        Ok(Err(e @ (MaskError::Filter { .. } | MaskError::FilterPanicked { .. }))) => Err(e),
        Ok(Err(other)) => Err(MaskError::Filter {
            name: name.to_string(),
            message: other.to_string(),
        }),
        Err(_) => Err(MaskError::FilterPanicked {
            name: name.to_string(),
        }),
    }
}
