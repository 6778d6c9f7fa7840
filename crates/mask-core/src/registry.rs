//! Named filters for the placeholder pipeline.
//!
//! A filter is a unary transform over a context value. The registry is owned
//! by a [`crate::TemplateEngine`]; registering needs `&mut`, running a pass
//! needs `&`, so a registry cannot change while a pass is reading it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::desensitize::{desensitize, SensitiveKind};
use crate::error::Result;
use crate::token::extract_display_segment;
use crate::value::to_display_string;

/// Name the mask parser is registered under.
pub const MASK_FILTER: &str = "mask";

/// A registered filter function.
pub type FilterFn = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Mapping from filter name to filter function.
#[derive(Clone)]
pub struct FilterRegistry {
    filters: BTreeMap<String, FilterFn>,
}

impl FilterRegistry {
    /// A registry holding only the `mask` filter.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_fallible(MASK_FILTER, |value| {
            Ok(Value::String(extract_display_segment(value)))
        });
        registry
    }

    /// A registry with no filters at all, not even `mask`.
    pub fn empty() -> Self {
        Self {
            filters: BTreeMap::new(),
        }
    }

    /// [`FilterRegistry::new`] plus one filter per [`SensitiveKind`], named
    /// after [`SensitiveKind::name`].
    pub fn with_desensitizers() -> Self {
        let mut registry = Self::new();
        for kind in SensitiveKind::ALL {
            registry.register_fallible(kind.name(), move |value| {
                desensitize(kind, &to_display_string(value)).map(Value::String)
            });
        }
        registry
    }

    /// Register a string transform. The current value is converted with
    /// [`to_display_string`] before the call. Re-registering a name replaces
    /// the previous filter.
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.register_fallible(name, move |value| {
            Ok(Value::String(filter(&to_display_string(value))))
        });
    }

    /// Register a filter that sees the raw value and may fail. A failure is
    /// reported as an evaluation fault for the placeholder being resolved.
    pub fn register_fallible<F>(&mut self, name: impl Into<String>, filter: F)
    where
        F: Fn(&Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter));
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.filters.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&FilterFn> {
        self.filters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.filters.keys().collect::<Vec<_>>())
            .finish()
    }
}
