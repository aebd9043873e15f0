//! pipestep - metastore transformation steps for batch data pipelines
//!
//! A pipeline file declares metastore tables (location, format, info-date
//! partitioning) and the transformation steps that produce them. Each step
//! is a plugin implementing [`Transformation`]: it reads declared tables for
//! an info date through a [`MetastoreReader`] and returns a [`Table`] that the
//! [`Runner`] persists into the step's output table.
//!
//! # Modules
//!
//! - [`models`] - Pipeline config model and structuring/unstructuring
//! - [`transformation`] - Transformation trait, flags and registry
//! - [`metastore`] - Reader and writer over declared tables
//! - [`session`] - Compute engine boundary and builtin engines
//! - [`runner`] - Executes declared steps
//! - [`config`] - Application configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod date_format;
pub mod metastore;
pub mod models;
pub mod runner;
pub mod session;
pub mod table;
pub mod transformation;

// Re-export commonly used types
pub use config::Config;
pub use metastore::{MetastoreError, MetastoreReader, MetastoreWriter};
pub use models::{
    DEFAULT_RECORDS_PER_PARTITION, InfoDateSettings, MetastoreTable, RunTransformer, StructureError, TableFormat,
    TransformationConfig, structure, unstructure,
};
pub use runner::{RunReport, Runner, RunnerError};
pub use session::{ComputeSession, LocalSession, MemorySession, SessionError};
pub use table::{Row, Table};
pub use transformation::{
    CliOption, ExtraOptions, Transformation, TransformationContext, TransformationInfo, TransformationRegistry,
};
