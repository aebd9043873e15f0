//! Transformation trait definition

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{CliOption, ExtraOptions, TransformationContext};
use crate::metastore::MetastoreReader;
use crate::table::Table;

/// A pipeline step producing one table per info date
///
/// Implementations are created once per run from a [`TransformationContext`]
/// and keep no state beyond it. `description` doubles as the command help
/// text, and `cli_options` lists the extra flags the step accepts; their
/// parsed values reach `run` through [`ExtraOptions`].
#[async_trait]
pub trait Transformation: Send + Sync {
    /// Build the step for one run
    fn create(ctx: TransformationContext) -> Self
    where
        Self: Sized;

    /// Registry name (matches `run_transformers[].name`)
    fn name() -> &'static str
    where
        Self: Sized;

    /// Human-readable description
    fn description() -> &'static str
    where
        Self: Sized;

    /// Extra command-line flags accepted by the step
    fn cli_options() -> Vec<CliOption>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// Session and config the step was created with
    fn context(&self) -> &TransformationContext;

    /// Produce the output table for `info_date`
    ///
    /// Errors from the engine are returned as-is.
    async fn run(
        &self,
        metastore: &MetastoreReader,
        info_date: NaiveDate,
        options: &BTreeMap<String, String>,
        extra: &ExtraOptions,
    ) -> eyre::Result<Table>;
}
