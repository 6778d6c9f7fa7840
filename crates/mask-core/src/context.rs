//! The context root placeholders are resolved against, and dotted data paths.
//!
//! # Path syntax
//!
//! - `"greeting"` -- top-level key
//! - `"user.name"` -- `name` inside the object under `user`
//! - `"users.0.name"` -- decimal segments index into arrays
//!
//! A path either resolves completely or not at all: when any segment is
//! missing, or the walk reaches a string, number, boolean or null before the
//! last segment, the lookup yields `None` rather than a partial result.
//!
//! Segments are taken verbatim. The surrounding expression is trimmed, but
//! `"x . y"` looks up the keys `"x "` and `" y"`.

use serde_json::{Map, Value};

use crate::error::{MaskError, Result};

/// A parsed data path, split on dots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPath<'a> {
    segments: Vec<&'a str>,
}

impl<'a> DataPath<'a> {
    /// Parse a dot-separated path.
    pub fn parse(path: &'a str) -> Self {
        Self {
            segments: path.split('.').collect(),
        }
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Walk `root` segment by segment.
    fn walk<'v>(&self, root: &'v Map<String, Value>) -> Option<&'v Value> {
        let (first, rest) = self.segments.split_first()?;
        let mut current = root.get(*first)?;
        for segment in rest {
            current = match current {
                Value::Object(map) => map.get(*segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Key/value store placeholders resolve against.
///
/// Keys keep insertion order (`serde_json` is built with `preserve_order`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    root: Map<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a context from a JSON document whose root is an object.
    ///
    /// # Errors
    ///
    /// Returns [`MaskError::JsonParse`] for malformed JSON and
    /// [`MaskError::ContextNotObject`] when the root is not an object.
    ///
    /// # Examples
    ///
    /// ```
    /// use mask_core::{Context, DataPath};
    ///
    /// let ctx = Context::from_json(r#"{"user":{"name":"Bob"}}"#).unwrap();
    /// assert_eq!(ctx.lookup(&DataPath::parse("user.name")).unwrap(), "Bob");
    /// assert!(ctx.lookup(&DataPath::parse("user.age")).is_none());
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Insert or replace a top-level key, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.root.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.root.shift_remove(key)
    }

    /// Resolve a path against the root.
    pub fn lookup(&self, path: &DataPath<'_>) -> Option<&Value> {
        path.walk(&self.root)
    }

    /// Shorthand for `lookup(&DataPath::parse(path))`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.lookup(&DataPath::parse(path))
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }
}

impl From<Map<String, Value>> for Context {
    fn from(root: Map<String, Value>) -> Self {
        Self { root }
    }
}

impl TryFrom<Value> for Context {
    type Error = MaskError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(MaskError::ContextNotObject {
                found: json_type_name(&other),
            }),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
