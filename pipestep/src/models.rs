//! Pipeline configuration model
//!
//! A pipeline file declares the transformation steps to run and the
//! metastore tables they read and write:
//!
//! ```yaml
//! run_transformers:
//!   - name: Identity
//!     info_date: 2022-02-14
//!     output_table: table_out1
//!     options:
//!       table: table1_sync
//! metastore_tables:
//!   - name: table1_sync
//!     description: Table 1 description
//!     format: parquet
//!     path: /data/table1
//!     info_date_settings:
//!       column: info_date
//!       format: yyyy-MM-dd
//!       start: 2017-01-31
//!     records_per_partition: 1000000
//! ```
//!
//! [`structure`] builds the typed model from the loosely typed mapping a YAML
//! parser produces, and [`unstructure`] turns it back into a JSON-compatible
//! mapping. The two are inverses except for the defaults filled in during
//! structuring and the integer coercion of `records_per_partition`.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use crate::date_format::{self, DateFormatError};

/// Rows per output file when a table does not say otherwise
pub const DEFAULT_RECORDS_PER_PARTITION: u64 = 500_000;

/// Info-date pattern when a table does not say otherwise
pub const DEFAULT_INFO_DATE_FORMAT: &str = "yyyy-MM-dd";

/// Text form of every calendar date in a pipeline file
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while structuring or validating a pipeline config
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("{path}: missing required field")]
    MissingField { path: String },

    #[error("{path}: unknown field")]
    UnknownField { path: String },

    #[error("{path}: expected {expected}, found {found}")]
    InvalidType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{path}: invalid value '{value}': {reason}")]
    InvalidValue { path: String, value: String, reason: String },

    #[error("Duplicate metastore table: {name}")]
    DuplicateTable { name: String },

    #[error("Transformer {transformer} writes to undeclared table {table}")]
    UndeclaredOutputTable { transformer: String, table: String },

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Storage format of a metastore table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableFormat {
    Parquet,
    Delta,
}

impl TableFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableFormat::Parquet => "parquet",
            TableFormat::Delta => "delta",
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parquet" => Ok(Self::Parquet),
            "delta" => Ok(Self::Delta),
            _ => Err(format!("unknown format '{}', expected parquet or delta", s)),
        }
    }
}

/// How a table records the info date of each row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoDateSettings {
    /// Column holding the info date
    pub column: String,

    /// Engine date pattern of the column
    pub format: String,

    /// First info date the table holds data for
    pub start: Option<NaiveDate>,
}

impl InfoDateSettings {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            format: DEFAULT_INFO_DATE_FORMAT.to_string(),
            start: None,
        }
    }

    /// Render an info date the way the column stores it
    pub fn render(&self, date: NaiveDate) -> Result<String, DateFormatError> {
        date_format::format_date(date, &self.format)
    }

    /// Whether data for `date` may exist given the table's start date
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start)
    }
}

/// A table declared in the metastore
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetastoreTable {
    pub name: String,
    pub description: String,
    pub format: TableFormat,
    pub path: String,
    pub info_date_settings: InfoDateSettings,
    pub records_per_partition: u64,
}

/// A declared execution of a transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTransformer {
    pub name: String,
    pub info_date: NaiveDate,
    pub output_table: String,
    pub options: BTreeMap<String, String>,
}

/// The whole pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformationConfig {
    pub run_transformers: Vec<RunTransformer>,
    pub metastore_tables: Vec<MetastoreTable>,
}

impl TransformationConfig {
    /// Parse and structure a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, StructureError> {
        let value: Value = serde_yaml::from_str(content)?;
        structure(&value)
    }

    /// Load, structure and validate a pipeline file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StructureError> {
        let path = path.as_ref();
        debug!(?path, "TransformationConfig::load: called");
        let content = fs::read_to_string(path).map_err(|source| StructureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the config back to YAML
    pub fn to_yaml_string(&self) -> Result<String, StructureError> {
        Ok(serde_yaml::to_string(&unstructure(self))?)
    }

    /// Check cross-references between steps and tables
    pub fn validate(&self) -> Result<(), StructureError> {
        let mut seen = HashSet::new();
        for table in &self.metastore_tables {
            if !seen.insert(table.name.as_str()) {
                return Err(StructureError::DuplicateTable {
                    name: table.name.clone(),
                });
            }
        }

        for step in &self.run_transformers {
            if !seen.contains(step.output_table.as_str()) {
                return Err(StructureError::UndeclaredOutputTable {
                    transformer: step.name.clone(),
                    table: step.output_table.clone(),
                });
            }
        }
        Ok(())
    }

    /// Find a declared table by name
    pub fn table(&self, name: &str) -> Option<&MetastoreTable> {
        self.metastore_tables.iter().find(|t| t.name == name)
    }

    /// Find the first declared execution of a transformer
    pub fn run_transformer(&self, name: &str) -> Option<&RunTransformer> {
        self.run_transformers.iter().find(|t| t.name == name)
    }
}

/// Build the typed config from a loosely typed mapping
pub fn structure(value: &Value) -> Result<TransformationConfig, StructureError> {
    let obj = expect_object(value, "<root>")?;
    reject_unknown(obj, "", &["run_transformers", "metastore_tables"])?;

    let run_transformers = expect_array(required(obj, "", "run_transformers")?, "run_transformers")?
        .iter()
        .enumerate()
        .map(|(i, v)| structure_run_transformer(v, &format!("run_transformers[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;

    let metastore_tables = expect_array(required(obj, "", "metastore_tables")?, "metastore_tables")?
        .iter()
        .enumerate()
        .map(|(i, v)| structure_metastore_table(v, &format!("metastore_tables[{}]", i)))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        run_transformers = run_transformers.len(),
        metastore_tables = metastore_tables.len(),
        "structure: complete"
    );

    Ok(TransformationConfig {
        run_transformers,
        metastore_tables,
    })
}

/// Turn the typed config back into a JSON-compatible mapping
pub fn unstructure(config: &TransformationConfig) -> Value {
    let run_transformers: Vec<Value> = config.run_transformers.iter().map(unstructure_run_transformer).collect();
    let metastore_tables: Vec<Value> = config.metastore_tables.iter().map(unstructure_metastore_table).collect();

    json!({
        "run_transformers": run_transformers,
        "metastore_tables": metastore_tables,
    })
}

fn structure_run_transformer(value: &Value, path: &str) -> Result<RunTransformer, StructureError> {
    let obj = expect_object(value, path)?;
    reject_unknown(obj, path, &["name", "info_date", "output_table", "options"])?;

    let options = match optional(obj, "options") {
        None => BTreeMap::new(),
        Some(v) => {
            let options_path = join(path, "options");
            expect_object(v, &options_path)?
                .iter()
                .map(|(k, v)| Ok((k.clone(), expect_string(v, &join(&options_path, k))?)))
                .collect::<Result<BTreeMap<_, _>, StructureError>>()?
        }
    };

    Ok(RunTransformer {
        name: required_string(obj, path, "name")?,
        info_date: required_date(obj, path, "info_date")?,
        output_table: required_string(obj, path, "output_table")?,
        options,
    })
}

fn unstructure_run_transformer(step: &RunTransformer) -> Value {
    json!({
        "name": step.name,
        "info_date": step.info_date.format(DATE_FORMAT).to_string(),
        "output_table": step.output_table,
        "options": step.options,
    })
}

fn structure_metastore_table(value: &Value, path: &str) -> Result<MetastoreTable, StructureError> {
    let obj = expect_object(value, path)?;
    reject_unknown(
        obj,
        path,
        &[
            "name",
            "description",
            "format",
            "path",
            "info_date_settings",
            "records_per_partition",
        ],
    )?;

    let format_path = join(path, "format");
    let format_raw = required_string(obj, path, "format")?;
    let format = format_raw
        .parse::<TableFormat>()
        .map_err(|reason| invalid_value(&format_path, &format_raw, reason))?;

    let description = match optional(obj, "description") {
        Some(v) => expect_string(v, &join(path, "description"))?,
        None => String::new(),
    };

    let settings_path = join(path, "info_date_settings");
    let info_date_settings = structure_info_date_settings(required(obj, path, "info_date_settings")?, &settings_path)?;

    let records_per_partition =
        structure_records_per_partition(optional(obj, "records_per_partition"), &join(path, "records_per_partition"))?;

    Ok(MetastoreTable {
        name: required_string(obj, path, "name")?,
        description,
        format,
        path: required_string(obj, path, "path")?,
        info_date_settings,
        records_per_partition,
    })
}

fn unstructure_metastore_table(table: &MetastoreTable) -> Value {
    json!({
        "name": table.name,
        "description": table.description,
        "format": table.format.as_str(),
        "path": table.path,
        "info_date_settings": unstructure_info_date_settings(&table.info_date_settings),
        "records_per_partition": table.records_per_partition,
    })
}

fn structure_info_date_settings(value: &Value, path: &str) -> Result<InfoDateSettings, StructureError> {
    let obj = expect_object(value, path)?;
    reject_unknown(obj, path, &["column", "format", "start"])?;

    let format = match optional(obj, "format") {
        Some(v) => {
            let format_path = join(path, "format");
            let format = expect_string(v, &format_path)?;
            date_format::to_chrono_format(&format).map_err(|e| invalid_value(&format_path, &format, e.to_string()))?;
            format
        }
        None => DEFAULT_INFO_DATE_FORMAT.to_string(),
    };

    let start = match optional(obj, "start") {
        Some(v) => Some(parse_iso_date(v, &join(path, "start"))?),
        None => None,
    };

    Ok(InfoDateSettings {
        column: required_string(obj, path, "column")?,
        format,
        start,
    })
}

fn unstructure_info_date_settings(settings: &InfoDateSettings) -> Value {
    let mut obj = Map::new();
    obj.insert("column".into(), Value::String(settings.column.clone()));
    obj.insert("format".into(), Value::String(settings.format.clone()));
    if let Some(start) = settings.start {
        obj.insert("start".into(), Value::String(start.format(DATE_FORMAT).to_string()));
    }
    Value::Object(obj)
}

fn structure_records_per_partition(value: Option<&Value>, path: &str) -> Result<u64, StructureError> {
    let records = match value {
        None => return Ok(DEFAULT_RECORDS_PER_PARTITION),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| invalid_value(path, &n.to_string(), "expected a non-negative integer"))?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|e| invalid_value(path, s, e.to_string()))?,
        Some(other) => {
            return Err(StructureError::InvalidType {
                path: path.to_string(),
                expected: "integer",
                found: type_name(other),
            });
        }
    };

    if records == 0 {
        return Err(invalid_value(path, "0", "must be greater than zero"));
    }
    Ok(records)
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

fn invalid_value(path: &str, value: &str, reason: impl Into<String>) -> StructureError {
    StructureError::InvalidValue {
        path: path.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn expect_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, StructureError> {
    value.as_object().ok_or_else(|| StructureError::InvalidType {
        path: path.to_string(),
        expected: "mapping",
        found: type_name(value),
    })
}

fn expect_array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>, StructureError> {
    value.as_array().ok_or_else(|| StructureError::InvalidType {
        path: path.to_string(),
        expected: "list",
        found: type_name(value),
    })
}

fn reject_unknown(obj: &Map<String, Value>, path: &str, known: &[&str]) -> Result<(), StructureError> {
    match obj.keys().find(|k| !known.contains(&k.as_str())) {
        Some(key) => Err(StructureError::UnknownField { path: join(path, key) }),
        None => Ok(()),
    }
}

// YAML leaves an empty value as null; treat it as absent.
fn optional<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

fn required<'a>(obj: &'a Map<String, Value>, path: &str, key: &str) -> Result<&'a Value, StructureError> {
    optional(obj, key).ok_or_else(|| StructureError::MissingField { path: join(path, key) })
}

// Numbers and booleans are not coerced; they would not survive unstructure.
fn expect_string(value: &Value, path: &str) -> Result<String, StructureError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(StructureError::InvalidType {
            path: path.to_string(),
            expected: "string",
            found: type_name(other),
        }),
    }
}

fn required_string(obj: &Map<String, Value>, path: &str, key: &str) -> Result<String, StructureError> {
    expect_string(required(obj, path, key)?, &join(path, key))
}

fn parse_iso_date(value: &Value, path: &str) -> Result<NaiveDate, StructureError> {
    let raw = expect_string(value, path)?;
    let date = NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| invalid_value(path, &raw, e.to_string()))?;
    // chrono also accepts unpadded fields, which would not render back identically
    if date.format(DATE_FORMAT).to_string() != raw {
        return Err(invalid_value(path, &raw, "expected YYYY-MM-DD"));
    }
    Ok(date)
}

fn required_date(obj: &Map<String, Value>, path: &str, key: &str) -> Result<NaiveDate, StructureError> {
    parse_iso_date(required(obj, path, key)?, &join(path, key))
}
