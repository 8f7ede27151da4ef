//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use crate::commands::classify::Classification;
use crate::commands::inspect::InspectionReport;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_inspection(&self, report: &InspectionReport) -> Result<()> {
        Self::output(&JsonOutput::success("inspect", report))
    }

    fn format_classification(&self, results: &[Classification]) -> Result<()> {
        Self::output(&JsonOutput::success("classify", results))
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let _ = Self::output(&JsonOutput::error(operation, format!("{error:#}")));
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData {
            message: String,
        }

        let output = JsonOutput::success(
            "warning",
            WarningData {
                message: message.to_string(),
            },
        );
        let _ = Self::output(&output);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_envelope() {
        let results = vec![Classification {
            path: "doc.pdf".to_string(),
            format: "pdf".to_string(),
        }];

        let json = serde_json::to_value(JsonOutput::success("classify", &results)).unwrap();
        assert_eq!(json["operation"], "classify");
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"][0]["format"], "pdf");
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_error_envelope() {
        let json = serde_json::to_value(JsonOutput::error("inspect", "boom")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
        assert!(json.get("data").is_none());
    }
}
