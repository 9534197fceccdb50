//! Agentforge library.
//!
//! Builds per-customer agents from platform core templates:
//!
//! - [`loader`] fetches the template and the factory record
//! - [`workspace`] owns the per-build scratch directory
//! - [`extract`] unpacks the template archive
//! - [`patch`] and [`markers`] inject keys and identifiers
//! - [`builder`] holds the per-platform stage pipelines and their registry
//! - [`build`] drives all of the above for one request

pub mod build;
pub mod builder;
pub mod commands;
pub mod common;
pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
pub mod markers;
pub mod patch;
pub mod store;
pub mod timing;
pub mod workspace;

pub use build::{create, Build, BuildOutput, BuildRequest, BuildState};
pub use error::{BuildError, ErrorKind};
