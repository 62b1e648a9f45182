//! # Callables
//!
//! A host function descriptor: a name, a [`Signature`], optional
//! documentation (the input of docstring annotation sources), and an
//! optional body. This is what a [`FunctionSchema`] introspects to derive
//! its parameter schemas.
//!
//! ## Binding
//!
//! [`Callable::bind`] maps positional and keyword arguments onto the
//! signature the usual way: positionals fill parameters left to right and
//! overflow into the variadic-positional parameter, keywords fill named
//! parameters and overflow into the variadic-keyword parameter, and
//! parameters still unbound take their default. Missing, duplicate or
//! unexpected arguments fail with [`SchemaError::SignatureMismatch`].
//!
//! [`FunctionSchema`]: crate::function::FunctionSchema

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use skema_core::{SchemaError, SchemaResult};

use crate::value::{Kwargs, Value};

type Body = Arc<dyn Fn(&BoundArgs) -> SchemaResult<Value> + Send + Sync>;

/// Ordered parameter list of a callable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    /// Named positional-or-keyword parameters, in declaration order.
    pub params: Vec<String>,
    /// Defaults of the trailing `defaults.len()` parameters.
    pub defaults: Vec<Value>,
    /// Name of the variadic-positional parameter.
    pub varargs: Option<String>,
    /// Name of the variadic-keyword parameter.
    pub varkw: Option<String>,
}

impl Signature {
    /// Index of the first defaulted parameter.
    pub fn first_default(&self) -> usize {
        self.params.len().saturating_sub(self.defaults.len())
    }

    /// Default of the parameter at `index`, if it lies in the defaulted suffix.
    pub fn default_at(&self, index: usize) -> Option<&Value> {
        index
            .checked_sub(self.first_default())
            .and_then(|offset| self.defaults.get(offset))
    }
}

/// Arguments bound to a signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    /// Named parameters, explicit or defaulted.
    pub named: BTreeMap<String, Value>,
    /// Overflow positional arguments.
    pub varargs: Vec<Value>,
    /// Overflow keyword arguments.
    pub varkw: Kwargs,
}

impl BoundArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }
}

/// Host function descriptor. Clones share the same function; equality is
/// identity.
#[derive(Clone)]
pub struct Callable(Arc<CallableInner>);

struct CallableInner {
    name: String,
    signature: Signature,
    doc: Option<String>,
    body: Option<Body>,
}

impl Callable {
    pub fn builder(name: impl Into<String>) -> CallableBuilder {
        CallableBuilder {
            name: name.into(),
            signature: Signature::default(),
            doc: None,
            body: None,
            misplaced: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn signature(&self) -> &Signature {
        &self.0.signature
    }

    pub fn doc(&self) -> Option<&str> {
        self.0.doc.as_deref()
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Bind call-site arguments to the signature.
    pub fn bind(&self, args: Vec<Value>, kwargs: Kwargs) -> SchemaResult<BoundArgs> {
        let sig = &self.0.signature;
        let mut bound = BoundArgs::default();

        for (index, value) in args.into_iter().enumerate() {
            match sig.params.get(index) {
                Some(name) => {
                    bound.named.insert(name.clone(), value);
                }
                None if sig.varargs.is_some() => bound.varargs.push(value),
                None => {
                    return Err(SchemaError::signature(
                        self.name(),
                        format!(
                            "takes {} positional arguments but more were given",
                            sig.params.len()
                        ),
                    ))
                }
            }
        }

        for (key, value) in kwargs {
            if sig.params.contains(&key) {
                if bound.named.contains_key(&key) {
                    return Err(SchemaError::signature(
                        self.name(),
                        format!("got multiple values for argument '{key}'"),
                    ));
                }
                bound.named.insert(key, value);
            } else if sig.varkw.is_some() {
                bound.varkw.insert(key, value);
            } else {
                return Err(SchemaError::signature(
                    self.name(),
                    format!("got an unexpected keyword argument '{key}'"),
                ));
            }
        }

        for (index, name) in sig.params.iter().enumerate() {
            if bound.named.contains_key(name) {
                continue;
            }
            match sig.default_at(index) {
                Some(default) => {
                    bound.named.insert(name.clone(), default.clone());
                }
                None => {
                    return Err(SchemaError::signature(
                        self.name(),
                        format!("missing required argument '{name}'"),
                    ))
                }
            }
        }

        Ok(bound)
    }

    /// Run the body on already-bound arguments.
    pub fn invoke(&self, args: &BoundArgs) -> SchemaResult<Value> {
        match &self.0.body {
            Some(body) => body(args),
            None => Err(SchemaError::Invocation {
                function: self.name().to_string(),
                reason: "callable has no body".into(),
            }),
        }
    }

    /// Bind and invoke.
    pub fn call(&self, args: Vec<Value>, kwargs: Kwargs) -> SchemaResult<Value> {
        let bound = self.bind(args, kwargs)?;
        self.invoke(&bound)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.0.name)
            .field("signature", &self.0.signature)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Callable`].
pub struct CallableBuilder {
    name: String,
    signature: Signature,
    doc: Option<String>,
    body: Option<Body>,
    misplaced: Option<String>,
}

impl CallableBuilder {
    /// Append a parameter without a default.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.signature.defaults.is_empty() && self.misplaced.is_none() {
            self.misplaced = Some(name.clone());
        }
        self.signature.params.push(name);
        self
    }

    /// Append a parameter with a default.
    pub fn param_with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.signature.params.push(name.into());
        self.signature.defaults.push(default.into());
        self
    }

    pub fn varargs(mut self, name: impl Into<String>) -> Self {
        self.signature.varargs = Some(name.into());
        self
    }

    pub fn varkw(mut self, name: impl Into<String>) -> Self {
        self.signature.varkw = Some(name.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn body<F>(mut self, body: F) -> Self
    where
        F: Fn(&BoundArgs) -> SchemaResult<Value> + Send + Sync + 'static,
    {
        self.body = Some(Arc::new(body));
        self
    }

    /// Finish the callable.
    ///
    /// Defaults must form a suffix: a parameter without a default may not
    /// follow one with a default.
    pub fn build(self) -> SchemaResult<Callable> {
        if let Some(name) = self.misplaced {
            return Err(SchemaError::signature(
                self.name,
                format!("non-default argument '{name}' follows default argument"),
            ));
        }
        Ok(Callable(Arc::new(CallableInner {
            name: self.name,
            signature: self.signature,
            doc: self.doc,
            body: self.body,
        })))
    }
}
