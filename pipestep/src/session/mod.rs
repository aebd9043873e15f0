//! Compute sessions
//!
//! A session is the engine that physically reads and writes table
//! partitions. The metastore and transformations only talk to the
//! [`ComputeSession`] trait, so the engine behind it can be swapped without
//! touching pipeline code.

mod error;
mod local;
mod memory;

pub use error::SessionError;
pub use local::LocalSession;
pub use memory::MemorySession;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::MetastoreTable;
use crate::table::Table;

/// Engine handle shared by every transformation of a run
#[async_trait]
pub trait ComputeSession: Send + Sync {
    /// Engine name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Info dates with a stored partition, ascending
    async fn list_partitions(&self, table: &MetastoreTable) -> Result<Vec<NaiveDate>, SessionError>;

    /// Read one partition
    async fn read_partition(&self, table: &MetastoreTable, info_date: NaiveDate) -> Result<Table, SessionError>;

    /// Replace one partition, returning the number of rows stored
    async fn write_partition(
        &self,
        table: &MetastoreTable,
        info_date: NaiveDate,
        data: &Table,
    ) -> Result<usize, SessionError>;
}
