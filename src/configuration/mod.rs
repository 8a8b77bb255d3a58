//! This module contains the loader's own configuration: how it logs and
//! which configuration store the monitoring configuration is projected from.
//!
//! Your starting point should probably be [`Configuration::load_from_default_path`].
//!
//! # Internals
//! The entire configuration structure is based on the concept of
//! unvalidated ("unresolved") and validated configuration structures.
//!
//! [`Configuration`] is loaded by deserializing the TOML file into the
//! [`UnresolvedConfiguration`] structure and then calling its `resolve`
//! method, which recursively turns it (and its tables) into validated
//! ("resolved") versions: level filters are parsed, the
//! `{CONFIGURATION_DIRECTORY}` placeholder is expanded and paths are canonicalized.
//!
//! The same pattern is used for the monitoring source in
//! [`crate::projection::source`], which is resolved out of a configuration store
//! instead of a TOML file.

#![allow(rustdoc::private_intra_doc_links)]

mod structure;
pub(crate) mod traits;
mod utilities;

pub use structure::*;
pub use traits::{ResolvableConfiguration, ResolvableConfigurationWithContext};
pub use utilities::CONFIGURATION_DIRECTORY_PLACEHOLDER;
