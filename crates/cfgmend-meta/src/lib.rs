//! Edit requests and patch schemas for cfgmend.
//!
//! This crate holds the plain value objects a patch is driven by: what the
//! caller wants changed ([`EditRequest`]) and what shape the managed document
//! has ([`PatchSchema`]). Both can be built in code or loaded from TOML, JSON
//! or YAML files with [`ConfigLoader`].

pub mod error;
pub mod loader;
pub mod request;
pub mod schema;

pub use error::{Error, Result};
pub use loader::{ConfigFormat, ConfigLoader};
pub use request::{EditRequest, FieldChange, FieldEdit, FieldValue, OptionalBlockEdit};
pub use schema::{ArraySpec, DiscriminantSpec, PatchSchema, Transport};
