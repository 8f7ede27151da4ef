//! Inspect command implementation.
//!
//! Runs discovery on a local file exactly as the service does for an upload,
//! without calling a signature engine, and prints the resulting file tree.

use crate::cli::InspectArgs;
use crate::error::add_file_context;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use eidas_core::ServiceConfig;
use eidas_core::SignedItem;
use eidas_core::VerifyError;
use eidas_core::Workspace;
use eidas_core::extraction::ExtractionEngine;
use eidas_core::formats::ContainerFormat;
use eidas_core::formats::MagicClassifier;
use eidas_core::formats::ParserSelector;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// One discovered file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectedFile {
    pub path: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detached_files: Vec<String>,
    pub has_payload: bool,
}

/// Everything discovered in one input file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionReport {
    pub source: String,
    pub max_depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    pub files: Vec<InspectedFile>,
}

pub fn execute(args: &InspectArgs, formatter: &dyn OutputFormatter) -> Result<()> {
    let config = load_config(args)?;

    let bytes = fs::read(&args.file)
        .with_context(|| format!("Failed to read '{}'", args.file.display()))?;
    if bytes.is_empty() {
        return Err(crate::error::convert_verify_error(
            VerifyError::EmptyUpload,
            &args.file,
        ));
    }

    let workspace = add_file_context(
        Workspace::create(&config.temp_dir, config.keep_workspace),
        &args.file,
    )?;
    let name = args
        .file
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    let top = add_file_context(workspace.write_upload(&name, &bytes), &args.file)?;

    let report = inspect(
        &top,
        &config,
        config.keep_workspace.then(|| workspace.path()),
    );
    debug!(files = report.files.len(), "inspection complete");

    formatter.format_inspection(&report)?;
    if let Some(kept) = &report.workspace {
        formatter.format_warning(&format!("Workspace kept at {kept}"));
    }
    Ok(())
}

fn load_config(args: &InspectArgs) -> Result<ServiceConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config '{}'", path.display()))?;
            serde_json::from_str::<ServiceConfig>(&raw)
                .with_context(|| format!("Invalid config '{}'", path.display()))?
        }
        None => ServiceConfig::default(),
    };

    if let Some(depth) = args.max_depth {
        config = config.with_max_nesting_depth(depth);
    }
    if args.keep_workspace {
        config = config.with_keep_workspace(true);
    }
    Ok(config)
}

/// Discovers every file reachable from `top` and describes each one.
fn inspect(top: &SignedItem, config: &ServiceConfig, kept: Option<&Path>) -> InspectionReport {
    let selector = ParserSelector::new(Arc::new(MagicClassifier), None);
    let engine = ExtractionEngine::new(selector.clone(), config.max_nesting_depth);
    let files = engine.list_all_files(top);

    let described = files
        .iter()
        .map(|file| {
            let parser = selector.select(file);
            InspectedFile {
                path: file.relative_path(),
                format: selector.classify_file(file.path()).to_string(),
                container: file.container().map(|container| {
                    container
                        .strip_prefix(file.root())
                        .unwrap_or(container)
                        .to_string_lossy()
                        .replace('\\', "/")
                }),
                detached_files: parser
                    .detached_files(&files)
                    .iter()
                    .map(SignedItem::relative_path)
                    .collect(),
                has_payload: parser.validation_payload().is_some(),
            }
        })
        .collect();

    InspectionReport {
        source: top.file_name(),
        max_depth: engine.max_depth(),
        workspace: kept.map(|path| path.display().to_string()),
        files: described,
    }
}
