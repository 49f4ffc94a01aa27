//! # hostpath-common
//!
//! Shared types, error definitions, configuration models, and constants
//! used across the hostpath provisioner workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the volume data model, the classified error
//! type, and the startup configuration that the other crates build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod quantity;
pub mod types;
