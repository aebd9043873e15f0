//! Runner - executes declared transformation steps

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use eyre::{Result, WrapErr};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::metastore::{MetastoreReader, MetastoreWriter};
use crate::models::{RunTransformer, TransformationConfig};
use crate::session::ComputeSession;
use crate::transformation::{ExtraOptions, TransformationContext, TransformationRegistry};

/// Errors raised by the runner itself, before or after a step runs
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Unknown transformation: {name}")]
    UnknownTransformation { name: String },

    #[error("Transformation {name} is not declared in run_transformers")]
    NotDeclared { name: String },
}

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub name: String,
    pub info_date: NaiveDate,
    pub output_table: String,
    pub rows_written: usize,
    pub duration_ms: u64,
}

/// Runs transformations against one pipeline config and session
pub struct Runner {
    registry: TransformationRegistry,
    session: Arc<dyn ComputeSession>,
    config: Arc<TransformationConfig>,
}

impl Runner {
    pub fn new(registry: TransformationRegistry, session: Arc<dyn ComputeSession>, config: TransformationConfig) -> Self {
        Self {
            registry,
            session,
            config: Arc::new(config),
        }
    }

    /// Run the first declared step named `name`
    ///
    /// `info_date` overrides the declared date; `options` are layered over
    /// the declared options.
    pub async fn run_one(
        &self,
        name: &str,
        info_date: Option<NaiveDate>,
        options: &BTreeMap<String, String>,
        extra: &ExtraOptions,
    ) -> Result<RunReport> {
        let declared = self
            .config
            .run_transformer(name)
            .ok_or_else(|| RunnerError::NotDeclared { name: name.to_string() })?;

        let mut step = declared.clone();
        if let Some(date) = info_date {
            step.info_date = date;
        }
        step.options.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));

        self.execute(&step, extra).await
    }

    /// Run every declared step in order, stopping at the first failure
    pub async fn run_all(&self) -> Result<Vec<RunReport>> {
        let mut reports = Vec::with_capacity(self.config.run_transformers.len());
        for step in &self.config.run_transformers {
            reports.push(self.execute(step, &ExtraOptions::new()).await?);
        }
        info!(steps = reports.len(), "All transformations complete");
        Ok(reports)
    }

    async fn execute(&self, step: &RunTransformer, extra: &ExtraOptions) -> Result<RunReport> {
        debug!(name = %step.name, info_date = %step.info_date, "Runner::execute: called");
        let started = Instant::now();

        let ctx = TransformationContext::new(self.session.clone(), self.config.clone());
        let transformation = self
            .registry
            .create(&step.name, ctx)
            .ok_or_else(|| RunnerError::UnknownTransformation {
                name: step.name.clone(),
            })?;

        let reader = MetastoreReader::new(self.session.clone(), self.config.clone(), step.info_date);
        let table = transformation
            .run(&reader, step.info_date, &step.options, extra)
            .await?;

        let writer = MetastoreWriter::new(self.session.clone(), self.config.clone());
        let rows_written = writer
            .write(&step.output_table, step.info_date, table)
            .await
            .wrap_err_with(|| format!("Failed to write output of {} to {}", step.name, step.output_table))?;

        let report = RunReport {
            name: step.name.clone(),
            info_date: step.info_date,
            output_table: step.output_table.clone(),
            rows_written,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        info!(
            name = %report.name,
            info_date = %report.info_date,
            output_table = %report.output_table,
            rows = report.rows_written,
            "Transformation complete"
        );
        Ok(report)
    }
}
