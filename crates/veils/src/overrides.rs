//! Substitute values configured at wrap time

use ahash::AHashMap;

use crate::value::Value;

/// Name-to-substitute tables for the overriding wrappers.
///
/// A name present in several tables resolves in the order properties,
/// methods, async methods.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub(crate) props: AHashMap<String, Value>,
    pub(crate) methods: AHashMap<String, Value>,
    pub(crate) async_methods: AHashMap<String, Value>,
}

impl Overrides {
    /// No overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace reads of property `name` with `value`
    pub fn prop(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.props.insert(name.to_string(), value.into());
        self
    }

    /// Make calls to method `name` return `value`
    pub fn method(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.methods.insert(name.to_string(), value.into());
        self
    }

    /// Make calls to async method `name` resolve to `value` without suspending
    pub fn async_method(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.async_methods.insert(name.to_string(), value.into());
        self
    }

    /// Check if `name` appears in any table
    pub fn covers(&self, name: &str) -> bool {
        self.props.contains_key(name)
            || self.methods.contains_key(name)
            || self.async_methods.contains_key(name)
    }

    /// Check for no overrides at all
    pub fn is_empty(&self) -> bool {
        self.props.is_empty() && self.methods.is_empty() && self.async_methods.is_empty()
    }
}
