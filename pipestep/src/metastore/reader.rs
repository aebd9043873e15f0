//! MetastoreReader - read access to declared tables for one run

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::MetastoreError;
use crate::models::{MetastoreTable, TransformationConfig};
use crate::session::ComputeSession;
use crate::table::Table;

/// Read access to the metastore, scoped to the declared tables and one info date
///
/// Every date argument is optional and falls back to the reader's info date,
/// so a transformation reading "today's" input only needs the table name.
/// Partitions dated before a table's `info_date_settings.start` are invisible.
#[derive(Clone)]
pub struct MetastoreReader {
    session: Arc<dyn ComputeSession>,
    config: Arc<TransformationConfig>,
    info_date: NaiveDate,
}

impl MetastoreReader {
    pub fn new(session: Arc<dyn ComputeSession>, config: Arc<TransformationConfig>, info_date: NaiveDate) -> Self {
        debug!(%info_date, session = session.name(), "MetastoreReader::new: called");
        Self {
            session,
            config,
            info_date,
        }
    }

    pub fn info_date(&self) -> NaiveDate {
        self.info_date
    }

    fn table(&self, name: &str) -> Result<&MetastoreTable, MetastoreError> {
        self.config
            .table(name)
            .ok_or_else(|| MetastoreError::UnknownTable { name: name.to_string() })
    }

    async fn available_dates(&self, table: &MetastoreTable) -> Result<Vec<NaiveDate>, MetastoreError> {
        let dates = self.session.list_partitions(table).await?;
        Ok(dates
            .into_iter()
            .filter(|d| table.info_date_settings.covers(*d))
            .collect())
    }

    /// Rows of `name` with info dates in `from..=to`
    pub async fn get_table(
        &self,
        name: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Table, MetastoreError> {
        let from = from.unwrap_or(self.info_date);
        let to = to.unwrap_or(self.info_date);
        debug!(%name, %from, %to, "MetastoreReader::get_table: called");

        if from > to {
            return Err(MetastoreError::InvalidRange { from, to });
        }

        let table = self.table(name)?;
        let mut result = Table::new();
        let mut partitions = 0;
        for date in self.available_dates(table).await? {
            if date < from || date > to {
                continue;
            }
            result = result.union(self.session.read_partition(table, date).await?);
            partitions += 1;
        }

        if partitions == 0 {
            warn!(%name, %from, %to, "get_table: no partitions in range");
        }
        debug!(%name, partitions, rows = result.len(), "get_table: complete");
        Ok(result)
    }

    /// Rows of the latest partition of `name` not after `until`
    pub async fn get_latest(&self, name: &str, until: Option<NaiveDate>) -> Result<Table, MetastoreError> {
        let table = self.table(name)?;
        let date = self.get_latest_available_date(name, until).await?;
        Ok(self.session.read_partition(table, date).await?)
    }

    /// Latest info date of `name` with data, not after `until`
    pub async fn get_latest_available_date(
        &self,
        name: &str,
        until: Option<NaiveDate>,
    ) -> Result<NaiveDate, MetastoreError> {
        let until = until.unwrap_or(self.info_date);
        let table = self.table(name)?;
        self.available_dates(table)
            .await?
            .into_iter()
            .rev()
            .find(|d| *d <= until)
            .ok_or_else(|| MetastoreError::NoDataAvailable {
                table: name.to_string(),
                until,
            })
    }

    /// Whether `name` has at least one partition in `from..=to`
    pub async fn is_data_available(
        &self,
        name: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<bool, MetastoreError> {
        let from = from.unwrap_or(self.info_date);
        let to = to.unwrap_or(self.info_date);
        if from > to {
            return Err(MetastoreError::InvalidRange { from, to });
        }

        let table = self.table(name)?;
        Ok(self
            .available_dates(table)
            .await?
            .into_iter()
            .any(|d| d >= from && d <= to))
    }
}
