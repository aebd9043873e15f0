//! UnionTables transformation - concatenate several tables

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::eyre;
use tracing::debug;

use crate::metastore::MetastoreReader;
use crate::table::Table;
use crate::transformation::{CliOption, ExtraOptions, Transformation, TransformationContext};

/// Union the tables listed in the comma-separated `tables` option
pub struct UnionTablesTransformation {
    ctx: TransformationContext,
}

#[async_trait]
impl Transformation for UnionTablesTransformation {
    fn create(ctx: TransformationContext) -> Self {
        Self { ctx }
    }

    fn name() -> &'static str {
        "UnionTables"
    }

    fn description() -> &'static str {
        "Union the tables listed in the comma-separated 'tables' option."
    }

    fn cli_options() -> Vec<CliOption> {
        vec![CliOption::flag(
            "latest",
            "Read each table's latest partition up to the info date instead of the info date itself",
        )]
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
        let names: Vec<&str> = options
            .get("tables")
            .map(|raw| raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        if names.is_empty() {
            return Err(eyre!("UnionTables requires a non-empty 'tables' option"));
        }

        let latest = extra.flag("latest");
        debug!(?names, latest, %info_date, "UnionTablesTransformation::run: called");

        let mut result = Table::new();
        for name in names {
            let part = if latest {
                metastore.get_latest(name, Some(info_date)).await?
            } else {
                metastore.get_table(name, Some(info_date), Some(info_date)).await?
            };
            result = result.union(part);
        }
        Ok(result)
    }
}
