//! Transformation plugins
//!
//! A transformation is one pipeline step: it reads metastore tables for an
//! info date and produces one output table. Each step is constructed from a
//! [`TransformationContext`] (compute session + pipeline config) and is
//! registered by name in a [`TransformationRegistry`].

mod context;
mod options;
mod registry;
mod traits;

pub mod builtin;

pub use context::TransformationContext;
pub use options::{CliOption, ExtraOptions};
pub use registry::{TransformationInfo, TransformationRegistry};
pub use traits::Transformation;
