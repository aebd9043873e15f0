//! Metastore error types

use chrono::NaiveDate;
use thiserror::Error;

use crate::date_format::DateFormatError;
use crate::session::SessionError;

/// Errors that can occur while reading or writing metastore tables
#[derive(Debug, Error)]
pub enum MetastoreError {
    #[error("Table {name} is not declared in the metastore")]
    UnknownTable { name: String },

    #[error("No data available in {table} until {until}")]
    NoDataAvailable { table: String, until: NaiveDate },

    #[error("Invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("Date format error: {0}")]
    DateFormat(#[from] DateFormatError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}
