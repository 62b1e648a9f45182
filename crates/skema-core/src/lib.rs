#![deny(missing_docs)]

//! # skema-core — Foundational Types for the Schema Engine
//!
//! This crate defines the primitives every other skema crate builds on: the
//! error hierarchy, schema identifiers, and the runtime data-type tower used
//! for registry dispatch and type validation. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One error enum.** Every fallible engine operation returns
//!    [`SchemaResult`]; callers match on [`SchemaError::kind`] rather than on
//!    message text.
//!
//! 2. **Opaque identifiers.** Schema instances and schema types are keyed by
//!    [`Uid`], never by bare strings.
//!
//! 3. **Single-inheritance type tower.** [`DataType`] models the builtin
//!    value types plus user classes, so "nearest registered ancestor" lookups
//!    are a linear walk of [`DataType::ancestors`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `skema-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod datatype;
pub mod error;
pub mod identity;

pub use datatype::{Ancestors, ClassDef, DataType, TypeNode};
pub use error::{ErrorKind, LookupKind, SchemaError, SchemaResult};
pub use identity::Uid;
