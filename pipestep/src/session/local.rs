//! Local filesystem session
//!
//! Partitions are stored under the table path, one directory per info date:
//!
//! ```text
//! {table.path}/
//! └── {column}={YYYY-MM-DD}/
//!     ├── part-00000.jsonl
//!     ├── part-00001.jsonl
//!     └── ...
//! ```
//!
//! Each part file holds at most `records_per_partition` rows, one JSON object
//! per line. Relative table paths resolve against the session root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::fs;
use tracing::{debug, info};

use super::{ComputeSession, SessionError};
use crate::models::MetastoreTable;
use crate::table::{Row, Table};

const PARTITION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Session storing partitions as line-delimited JSON on the local disk
pub struct LocalSession {
    root: PathBuf,
}

impl LocalSession {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(?root, "LocalSession::new: called");
        Self { root }
    }

    /// Directory holding every partition of `table`
    pub fn table_dir(&self, table: &MetastoreTable) -> PathBuf {
        let path = Path::new(&table.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Directory holding one partition of `table`
    pub fn partition_dir(&self, table: &MetastoreTable, info_date: NaiveDate) -> PathBuf {
        self.table_dir(table).join(format!(
            "{}={}",
            table.info_date_settings.column,
            info_date.format(PARTITION_DATE_FORMAT)
        ))
    }

    /// Hidden directory next to a partition, never listed as one
    fn sibling(dir: &Path, suffix: &str) -> PathBuf {
        let name = dir.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        dir.with_file_name(format!(".{}.{}", name, suffix))
    }

    async fn remove_if_exists(dir: &Path) -> Result<(), SessionError> {
        match fs::remove_dir_all(dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::io(dir, e)),
        }
    }

    async fn part_files(dir: &Path) -> Result<Vec<PathBuf>, SessionError> {
        let mut entries = fs::read_dir(dir).await.map_err(|e| SessionError::io(dir, e))?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| SessionError::io(dir, e))? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("part-") && name.ends_with(".jsonl") {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl ComputeSession for LocalSession {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn list_partitions(&self, table: &MetastoreTable) -> Result<Vec<NaiveDate>, SessionError> {
        let dir = self.table_dir(table);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SessionError::io(dir, e)),
        };

        let prefix = format!("{}=", table.info_date_settings.column);
        let mut dates = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| SessionError::io(&dir, e))? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let Some(raw) = name.strip_prefix(&prefix) else {
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(raw, PARTITION_DATE_FORMAT) else {
                continue;
            };
            let file_type = entry.file_type().await.map_err(|e| SessionError::io(entry.path(), e))?;
            if file_type.is_dir() {
                dates.push(date);
            }
        }

        dates.sort();
        Ok(dates)
    }

    async fn read_partition(&self, table: &MetastoreTable, info_date: NaiveDate) -> Result<Table, SessionError> {
        let dir = self.partition_dir(table, info_date);
        debug!(?dir, format = %table.format, "LocalSession::read_partition: called");

        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(SessionError::PartitionNotFound {
                    table: table.name.clone(),
                    info_date,
                });
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SessionError::PartitionNotFound {
                    table: table.name.clone(),
                    info_date,
                });
            }
            Err(e) => return Err(SessionError::io(dir, e)),
        }

        let mut rows = Vec::new();
        for file in Self::part_files(&dir).await? {
            let content = fs::read_to_string(&file).await.map_err(|e| SessionError::io(&file, e))?;
            for (i, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let row: Row = serde_json::from_str(line).map_err(|source| SessionError::MalformedRow {
                    path: file.clone(),
                    line: i + 1,
                    source,
                })?;
                rows.push(row);
            }
        }

        Ok(Table::from_rows(rows))
    }

    async fn write_partition(
        &self,
        table: &MetastoreTable,
        info_date: NaiveDate,
        data: &Table,
    ) -> Result<usize, SessionError> {
        let dir = self.partition_dir(table, info_date);
        debug!(?dir, format = %table.format, rows = data.len(), "LocalSession::write_partition: called");

        // Part files go to a hidden sibling first so a failed write keeps the old partition
        let staging = Self::sibling(&dir, "staging");
        Self::remove_if_exists(&staging).await?;
        fs::create_dir_all(&staging).await.map_err(|e| SessionError::io(&staging, e))?;

        let chunk_size = usize::try_from(table.records_per_partition).unwrap_or(usize::MAX).max(1);
        let mut chunks: Vec<&[Row]> = data.rows().chunks(chunk_size).collect();
        // An empty partition still marks the date as processed
        if chunks.is_empty() {
            chunks.push(&[]);
        }

        for (i, chunk) in chunks.iter().enumerate() {
            let mut content = String::new();
            for row in chunk.iter() {
                content.push_str(&serde_json::to_string(row)?);
                content.push('\n');
            }
            let file = staging.join(format!("part-{:05}.jsonl", i));
            fs::write(&file, content).await.map_err(|e| SessionError::io(&file, e))?;
        }

        let replaced = Self::sibling(&dir, "replaced");
        Self::remove_if_exists(&replaced).await?;
        match fs::rename(&dir, &replaced).await {
            Ok(()) => debug!(?dir, "write_partition: replacing existing partition"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(SessionError::io(dir, e)),
        }
        fs::rename(&staging, &dir).await.map_err(|e| SessionError::io(&dir, e))?;
        Self::remove_if_exists(&replaced).await?;

        info!(table = %table.name, %info_date, rows = data.len(), files = chunks.len(), "Partition written");
        Ok(data.len())
    }
}
