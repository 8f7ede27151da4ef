//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use crate::commands::classify::Classification;
use crate::commands::inspect::InspectedFile;
use crate::commands::inspect::InspectionReport;
use anyhow::Result;
use console::Term;
use console::style;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
    errors: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
            errors: Term::stderr(),
        }
    }

    fn plural(n: usize, word: &str) -> String {
        if n == 1 {
            format!("{n} {word}")
        } else {
            format!("{n} {word}s")
        }
    }

    fn describe(&self, file: &InspectedFile) -> String {
        let marker = if file.has_payload { "*" } else { " " };
        let mut line = format!("{marker} {:<16} {}", file.format, file.path);
        if let Some(container) = file.container.as_ref().filter(|_| self.verbose) {
            line.push_str(&format!("  (from {container})"));
        }
        line
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_inspection(&self, report: &InspectionReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        let summary = format!(
            "Inspected {}: {}",
            report.source,
            Self::plural(report.files.len(), "file")
        );
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {summary}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(&summary);
        }

        let _ = self.term.write_line("");
        for file in &report.files {
            let _ = self.term.write_line(&self.describe(file));
            for detached in &file.detached_files {
                let _ = self.term.write_line(&format!("      covers {detached}"));
            }
        }

        if self.verbose {
            let _ = self.term.write_line("");
            let _ = self
                .term
                .write_line(&format!("  Max nesting depth: {}", report.max_depth));
            let _ = self
                .term
                .write_line("  * validated by the signature engine");
        }

        Ok(())
    }

    fn format_classification(&self, results: &[Classification]) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        for result in results {
            let format = if self.use_colors {
                style(&result.format).cyan().to_string()
            } else {
                result.format.clone()
            };
            let _ = self
                .term
                .write_line(&format!("{}: {format}", result.path));
        }

        Ok(())
    }

    fn format_error(&self, _operation: &str, error: &anyhow::Error) {
        let line = if self.use_colors {
            format!("{} {error:?}", style("ERROR:").red().bold())
        } else {
            format!("ERROR: {error:?}")
        };
        let _ = self.errors.write_line(&line);
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn file(path: &str, container: Option<&str>, has_payload: bool) -> InspectedFile {
        InspectedFile {
            path: path.to_string(),
            format: "pdf".to_string(),
            container: container.map(str::to_string),
            detached_files: Vec::new(),
            has_payload,
        }
    }

    #[test]
    fn test_plural() {
        assert_eq!(HumanFormatter::plural(0, "file"), "0 files");
        assert_eq!(HumanFormatter::plural(1, "file"), "1 file");
        assert_eq!(HumanFormatter::plural(3, "file"), "3 files");
    }

    #[test]
    fn test_describe_marks_payload() {
        let formatter = HumanFormatter::new(false, false);
        let line = formatter.describe(&file("a.pdf", Some("bundle.zip"), true));
        assert!(line.starts_with('*'));
        assert!(line.ends_with("a.pdf"));
    }

    #[test]
    fn test_describe_verbose_shows_container() {
        let formatter = HumanFormatter::new(true, false);
        let line = formatter.describe(&file("a.pdf", Some("bundle.zip"), false));
        assert!(line.starts_with(' '));
        assert!(line.contains("(from bundle.zip)"));
    }
}
