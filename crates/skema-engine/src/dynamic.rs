//! # Deferred Values
//!
//! [`DynamicValue`] wraps a zero-argument closure evaluated at the moment a
//! value is actually needed: once per instantiation for a declared default,
//! or once per assignment when handed to [`Schema::set_dynamic`]. A provider
//! is never stored as a live default, so mutable defaults (an empty array,
//! the current time, a fresh identifier) are never shared between instances.
//!
//! [`This`] is the self-reference placeholder: declared as a member of a
//! schema type, it is replaced by the content resolver with an instance of
//! that same type built from the carried keyword arguments.
//!
//! [`Schema::set_dynamic`]: crate::schema::Schema::set_dynamic

use std::fmt;
use std::sync::Arc;

use crate::value::{Kwargs, Value};

/// A deferred value provider.
#[derive(Clone)]
pub struct DynamicValue(Arc<dyn Fn() -> Value + Send + Sync>);

impl DynamicValue {
    pub fn new<F>(provider: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(provider))
    }

    /// Run the provider.
    pub fn evaluate(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for DynamicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DynamicValue(..)")
    }
}

/// Placeholder for a nested instance of the declaring schema type.
#[derive(Debug, Clone, Default)]
pub struct This {
    kwargs: Kwargs,
}

impl This {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constructor override applied when the placeholder is resolved.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn kwargs(&self) -> &Kwargs {
        &self.kwargs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    #[test]
    fn test_provider_runs_on_every_evaluation() {
        let counter = Arc::new(AtomicI64::new(0));
        let c = Arc::clone(&counter);
        let provider = DynamicValue::new(move || Value::Int(c.fetch_add(1, Ordering::SeqCst)));
        assert_eq!(provider.evaluate(), Value::Int(0));
        assert_eq!(provider.evaluate(), Value::Int(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_fresh_arrays_are_independent() {
        let provider = DynamicValue::new(|| Value::Array(Vec::new()));
        let mut a = provider.evaluate();
        if let Value::Array(items) = &mut a {
            items.push(Value::Int(1));
        }
        assert_eq!(provider.evaluate(), Value::Array(Vec::new()));
    }

    #[test]
    fn test_this_carries_kwargs() {
        let this = This::new().with("nullable", true);
        assert_eq!(this.kwargs().get("nullable"), Some(&Value::Bool(true)));
    }
}
