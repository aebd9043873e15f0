//! In-process session

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ComputeSession, SessionError};
use crate::models::MetastoreTable;
use crate::table::Table;

/// Session keeping every partition in memory, keyed by table path
#[derive(Default)]
pub struct MemorySession {
    tables: RwLock<HashMap<String, BTreeMap<NaiveDate, Table>>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ComputeSession for MemorySession {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_partitions(&self, table: &MetastoreTable) -> Result<Vec<NaiveDate>, SessionError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table.path)
            .map(|parts| parts.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn read_partition(&self, table: &MetastoreTable, info_date: NaiveDate) -> Result<Table, SessionError> {
        let tables = self.tables.read().await;
        tables
            .get(&table.path)
            .and_then(|parts| parts.get(&info_date))
            .cloned()
            .ok_or_else(|| SessionError::PartitionNotFound {
                table: table.name.clone(),
                info_date,
            })
    }

    async fn write_partition(
        &self,
        table: &MetastoreTable,
        info_date: NaiveDate,
        data: &Table,
    ) -> Result<usize, SessionError> {
        debug!(table = %table.name, %info_date, rows = data.len(), "MemorySession::write_partition: called");
        let mut tables = self.tables.write().await;
        tables
            .entry(table.path.clone())
            .or_default()
            .insert(info_date, data.clone());
        Ok(data.len())
    }
}
