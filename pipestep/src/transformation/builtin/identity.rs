//! Identity transformation - copy a table partition

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::eyre;
use tracing::debug;

use crate::metastore::MetastoreReader;
use crate::table::Table;
use crate::transformation::{CliOption, ExtraOptions, Transformation, TransformationContext};

/// Return the `table` option's partition for the info date
///
/// The source's info-date column is dropped; the writer stamps the output
/// table's own column.
pub struct IdentityTransformation {
    ctx: TransformationContext,
}

#[async_trait]
impl Transformation for IdentityTransformation {
    fn create(ctx: TransformationContext) -> Self {
        Self { ctx }
    }

    fn name() -> &'static str {
        "Identity"
    }

    fn description() -> &'static str {
        "Copy the partition of the table named by the 'table' option for the info date."
    }

    fn cli_options() -> Vec<CliOption> {
        vec![CliOption::value("limit", "Keep at most this many rows")]
    }

    fn context(&self) -> &TransformationContext {
        &self.ctx
    }

    async fn run(
        &self,
        metastore: &MetastoreReader,
        info_date: NaiveDate,
        options: &BTreeMap<String, String>,
        extra: &ExtraOptions,
    ) -> eyre::Result<Table> {
        let source = options
            .get("table")
            .ok_or_else(|| eyre!("Identity requires the 'table' option"))?;
        debug!(%source, %info_date, "IdentityTransformation::run: called");

        let table = metastore.get_table(source, Some(info_date), Some(info_date)).await?;
        let table = match extra.get_parsed::<usize>("limit")? {
            Some(limit) => table.head(limit),
            None => table,
        };

        let Some(declared) = self.context().config.table(source) else {
            return Ok(table);
        };
        let column = &declared.info_date_settings.column;
        Ok(table
            .into_rows()
            .into_iter()
            .map(|mut row| {
                row.remove(column);
                row
            })
            .collect())
    }
}
