//! Classify command implementation.

use crate::cli::ClassifyArgs;
use crate::output::OutputFormatter;
use anyhow::Result;
use anyhow::anyhow;
use eidas_core::formats::MagicClassifier;
use eidas_core::formats::detect::classify_file;
use serde::Serialize;

/// Content-based format of one file.
#[derive(Debug, Serialize)]
pub struct Classification {
    pub path: String,
    pub format: String,
}

pub fn execute(args: &ClassifyArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let mut results = Vec::with_capacity(args.files.len());

    for file in &args.files {
        if !file.is_file() {
            return Err(anyhow!(
                "File not found: {}\n\
                 HINT: Check the path; directories cannot be classified.",
                file.display()
            ));
        }
        results.push(Classification {
            path: file.display().to_string(),
            format: classify_file(&MagicClassifier, file).to_string(),
        });
    }

    formatter.format_classification(&results)
}
