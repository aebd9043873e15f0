//! MetastoreWriter - persists transformation results

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use super::MetastoreError;
use crate::models::TransformationConfig;
use crate::session::ComputeSession;
use crate::table::Table;

/// Write access to the declared tables
#[derive(Clone)]
pub struct MetastoreWriter {
    session: Arc<dyn ComputeSession>,
    config: Arc<TransformationConfig>,
}

impl MetastoreWriter {
    pub fn new(session: Arc<dyn ComputeSession>, config: Arc<TransformationConfig>) -> Self {
        Self { session, config }
    }

    /// Replace the `info_date` partition of `name` with `data`
    ///
    /// Every row gets the table's info-date column set to `info_date`,
    /// rendered with the table's date pattern. Returns the rows written.
    pub async fn write(&self, name: &str, info_date: NaiveDate, data: Table) -> Result<usize, MetastoreError> {
        debug!(%name, %info_date, rows = data.len(), "MetastoreWriter::write: called");
        let table = self
            .config
            .table(name)
            .ok_or_else(|| MetastoreError::UnknownTable { name: name.to_string() })?;

        let settings = &table.info_date_settings;
        let stamped = data.with_column(&settings.column, Value::String(settings.render(info_date)?));

        let written = self.session.write_partition(table, info_date, &stamped).await?;
        info!(%name, %info_date, rows = written, "Table written");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metastore::MetastoreReader;
    use crate::models::{InfoDateSettings, MetastoreTable, TableFormat};
    use crate::session::MemorySession;
    use serde_json::json;

    fn config() -> Arc<TransformationConfig> {
        let mut settings = InfoDateSettings::new("INFORMATION_DATE");
        settings.format = "dd/MM/yyyy".to_string();
        Arc::new(TransformationConfig {
            run_transformers: vec![],
            metastore_tables: vec![MetastoreTable {
                name: "out".to_string(),
                description: "Output".to_string(),
                format: TableFormat::Parquet,
                path: "/mem/out".to_string(),
                info_date_settings: settings,
                records_per_partition: 10,
            }],
        })
    }

    #[tokio::test]
    async fn test_write_stamps_info_date_column() {
        let session: Arc<dyn ComputeSession> = Arc::new(MemorySession::new());
        let config = config();
        let writer = MetastoreWriter::new(session.clone(), config.clone());
        let info_date = NaiveDate::from_ymd_opt(2022, 2, 14).unwrap();

        let data: Table = vec![
            json!({"id": 1, "INFORMATION_DATE": "stale"}).as_object().cloned().unwrap(),
            json!({"id": 2}).as_object().cloned().unwrap(),
        ]
        .into_iter()
        .collect();

        let written = writer.write("out", info_date, data).await.unwrap();
        assert_eq!(written, 2);

        let reader = MetastoreReader::new(session, config, info_date);
        let stored = reader.get_table("out", None, None).await.unwrap();
        assert!(stored.rows().iter().all(|r| r["INFORMATION_DATE"] == json!("14/02/2022")));
    }

    #[tokio::test]
    async fn test_write_unknown_table() {
        let writer = MetastoreWriter::new(Arc::new(MemorySession::new()), config());
        let err = writer
            .write("missing", NaiveDate::from_ymd_opt(2022, 2, 14).unwrap(), Table::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MetastoreError::UnknownTable { .. }));
    }
}
