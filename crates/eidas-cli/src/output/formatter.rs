//! Output formatter trait for CLI results.

use crate::commands::classify::Classification;
use crate::commands::inspect::InspectionReport;
use anyhow::Result;
use serde::Serialize;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format the files discovered in one document
    fn format_inspection(&self, report: &InspectionReport) -> Result<()>;

    /// Format file classifications
    fn format_classification(&self, results: &[Classification]) -> Result<()>;

    /// Report the error that ended `operation`; shown even in quiet mode
    fn format_error(&self, operation: &str, error: &anyhow::Error);

    /// Format warning message
    fn format_warning(&self, message: &str);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}
