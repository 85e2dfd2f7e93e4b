//! Output formatting and reporting
//!
//! Renders findings of a schema build for humans (colored) or as JSON.

use anyhow::Result;
use colored::*;
use serde_json::json;
use yangtree_core::{Finding, Severity};

use crate::OutputFormat;

/// Summary statistics for a check run
#[derive(Debug, Clone, Default)]
pub struct CheckSummary {
    pub documents: usize,
    pub modules: usize,
    pub errors: usize,
    pub warnings: usize,
    pub hints: usize,
    pub info: usize,
}

impl CheckSummary {
    pub fn new(documents: usize, modules: usize) -> Self {
        Self {
            documents,
            modules,
            ..Default::default()
        }
    }

    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Hint => self.hints += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn total_findings(&self) -> usize {
        self.errors + self.warnings + self.hints + self.info
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// A finding together with its effective severity
pub struct ReportedFinding<'a> {
    pub finding: &'a Finding,
    pub severity: Severity,
}

/// Output formatter for different formats
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format and print check results
    pub fn print_results(&self, findings: &[ReportedFinding<'_>], summary: &CheckSummary) -> Result<()> {
        match self.format {
            OutputFormat::Human => {
                self.print_human_format(findings, summary);
                Ok(())
            }
            OutputFormat::Json => self.print_json_format(findings, summary),
        }
    }

    fn print_human_format(&self, findings: &[ReportedFinding<'_>], summary: &CheckSummary) {
        for reported in findings {
            println!("{}", render_human(reported));
        }
        if findings.is_empty() {
            println!("{} No findings", "✅".green());
        }
        self.print_summary_human(summary);
    }

    fn print_summary_human(&self, summary: &CheckSummary) {
        println!("\n{}", "Summary:".bold());
        println!("  Documents built: {}", summary.documents);
        println!("  Modules: {}", summary.modules);

        if summary.total_findings() > 0 {
            println!("  Findings:");
            if summary.errors > 0 {
                println!("    Errors: {}", summary.errors.to_string().red());
            }
            if summary.warnings > 0 {
                println!("    Warnings: {}", summary.warnings.to_string().yellow());
            }
            if summary.hints > 0 {
                println!("    Hints: {}", summary.hints.to_string().cyan());
            }
            if summary.info > 0 {
                println!("    Info: {}", summary.info.to_string().blue());
            }
        }
    }

    fn print_json_format(&self, findings: &[ReportedFinding<'_>], summary: &CheckSummary) -> Result<()> {
        let findings: Vec<serde_json::Value> = findings.iter().map(finding_to_json).collect();
        let output = json!({
            "findings": findings,
            "summary": {
                "documents": summary.documents,
                "modules": summary.modules,
                "errors": summary.errors,
                "warnings": summary.warnings,
                "hints": summary.hints,
                "info": summary.info,
            }
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
        Severity::Hint => "hint".cyan().bold(),
        Severity::Info => "info".blue().bold(),
    }
}

fn render_human(reported: &ReportedFinding<'_>) -> String {
    let finding = reported.finding;
    let mut line = format!(
        "{}[{}]: {}",
        severity_label(reported.severity),
        finding.kind.code(),
        finding.message.bold()
    );
    if let Some(element) = finding.target.element() {
        line.push_str(&format!("\n  {} {}", "-->".blue(), element));
    }
    line
}

fn finding_to_json(reported: &ReportedFinding<'_>) -> serde_json::Value {
    let finding = reported.finding;
    let element = finding.target.element();
    json!({
        "code": finding.kind.code(),
        "kind": finding.kind,
        "severity": reported.severity,
        "message": finding.message,
        "source": element.and_then(|e| e.source.as_deref()),
        "statement": element.map(|e| e.name.as_str()),
        "line": element.and_then(|e| e.line),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use yangtree_core::FindingKind;

    #[test]
    fn test_summary_counts() {
        let mut summary = CheckSummary::new(2, 1);
        summary.record(Severity::Error);
        summary.record(Severity::Warning);
        summary.record(Severity::Warning);
        assert_eq!(summary.total_findings(), 3);
        assert!(summary.has_errors());
        assert_eq!(summary.warnings, 2);
    }

    #[test]
    fn test_json_finding_shape() {
        let finding = Finding::general(FindingKind::IdentityCycle, "Identity cycle: a -> b -> a");
        let value = finding_to_json(&ReportedFinding {
            finding: &finding,
            severity: Severity::Error,
        });
        assert_eq!(value["code"], "P130");
        assert_eq!(value["kind"], "identity-cycle");
        assert_eq!(value["severity"], "error");
        assert!(value["source"].is_null());
    }

    #[test]
    fn test_human_rendering_without_colors() {
        colored::control::set_override(false);
        let finding = Finding::general(FindingKind::UnresolvableInclude, "Submodule x not found in input.");
        let rendered = render_human(&ReportedFinding {
            finding: &finding,
            severity: Severity::Error,
        });
        assert_eq!(rendered, "error[P037]: Submodule x not found in input.");
    }
}
