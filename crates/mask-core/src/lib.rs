//! # mask-core
//!
//! Display-side handling of masked values.
//!
//! A sensitive field travels as a **mask token**,
//! `_mask|algorithm|nonce|encrypt|mac|mask`: an opaque encrypted payload next
//! to a pre-masked display segment such as `138****5678`. Front-ends only ever
//! show the display segment. This crate extracts it, and offers a small
//! placeholder engine that rewrites `{{ path | filter }}` markers in text and
//! attributes of a host tree, with `mask` available as a filter.
//!
//! ## Quick start
//!
//! ```rust
//! use serde_json::json;
//! use mask_core::{extract_str, Context, Element, Node, TemplateEngine};
//!
//! assert_eq!(extract_str("_mask|GM|bm9uY2U|ZW5j|bWFj|B*b"), "B*b");
//!
//! let ctx = Context::from_json(r#"{"user":{"name":"_mask|1|2|3|4|Bob"},"greeting":"Hi"}"#).unwrap();
//! let engine = TemplateEngine::new(ctx);
//!
//! let mut tree: Node = Element::new("p")
//!     .with_attribute("title", "{{greeting}}")
//!     .with_text("Hello {{user.name | mask}}!")
//!     .into();
//! engine.scan_now(&mut tree);
//!
//! let p = tree.as_element().unwrap();
//! assert_eq!(p.get("title"), Some("Hi"));
//! assert_eq!(tree.text_content(), "Hello Bob!");
//! ```
//!
//! ## Modules
//!
//! - [`token`] — mask token parsing and composition
//! - [`desensitize`] — rules producing display segments (phone, e-mail, names, ...)
//! - [`context`] — context root and dotted data paths
//! - [`registry`] — named filters
//! - [`expression`] — `path | filter` expressions
//! - [`placeholder`] — locating `{{ }}` in text
//! - [`engine`] — resolution and tree passes
//! - [`tree`] — host tree trait and an in-memory tree
//! - [`tags`] — `<MaskData>` element processing
//! - [`error`] — error types

pub mod context;
pub mod desensitize;
pub mod engine;
pub mod error;
pub mod expression;
pub mod placeholder;
pub mod registry;
pub mod tags;
pub mod token;
pub mod tree;
pub mod value;

pub use context::{Context, DataPath};
pub use desensitize::{desensitize, mask_with_index, SensitiveKind};
pub use engine::{EngineState, Evaluation, Miss, ScanReport, TemplateEngine};
pub use error::MaskError;
pub use expression::Expression;
pub use registry::{FilterFn, FilterRegistry, MASK_FILTER};
pub use tags::process_mask_data_tags;
pub use token::{extract_display_segment, extract_str, AlgorithmMode, MaskToken};
pub use tree::{Attribute, Element, HostNode, Node};
pub use value::to_display_string;
