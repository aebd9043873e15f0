//! Metastore access for transformations
//!
//! The reader and writer expose the tables declared in a pipeline config,
//! partitioned by info date, on top of a [`ComputeSession`](crate::session::ComputeSession).

mod error;
mod reader;
mod writer;

pub use error::MetastoreError;
pub use reader::MetastoreReader;
pub use writer::MetastoreWriter;
