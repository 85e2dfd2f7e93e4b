//! `yangtree check`: build all documents and report findings

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info};
use yangtree_core::{Engine, FindingCollector, FindingSeverity, Schema, Severity, YangError};

use crate::output::{CheckSummary, OutputFormatter, ReportedFinding};
use crate::{FeatureArgs, OutputFormat};

/// Returns `false` when the schema has errors or the build aborted
pub fn check_command(
    paths: Vec<PathBuf>,
    format: OutputFormat,
    min_severity: Severity,
    features: FeatureArgs,
    fail_fast: Option<Severity>,
    config_path: Option<PathBuf>,
) -> Result<bool> {
    let mut config = super::resolve_config(config_path.as_deref(), &features)?;
    if let Some(severity) = fail_fast {
        config.fail_fast = Some(match severity {
            Severity::Error => FindingSeverity::Error,
            Severity::Warning => FindingSeverity::Warn,
            Severity::Hint => FindingSeverity::Hint,
            Severity::Info => FindingSeverity::Info,
        });
    }

    let files = super::collect_documents(&paths)?;
    info!("Checking {} documents", files.len());
    let documents = super::load_documents(&files)?;
    let formatter = OutputFormatter::new(format);
    let policy = config.severity_policy()?;

    let schema = match Engine::new(config).build(documents) {
        Ok(schema) => schema,
        Err(YangError::FailFast { finding }) => {
            debug!("Build aborted by fail-fast");
            let mut summary = CheckSummary::new(files.len(), 0);
            let severity = policy
                .severity_of(finding.kind)
                .unwrap_or_else(|| finding.kind.default_severity());
            summary.record(severity);
            formatter.print_results(
                &[ReportedFinding {
                    finding: &finding,
                    severity,
                }],
                &summary,
            )?;
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    let (reported, summary) = report(&schema, files.len(), min_severity);
    formatter.print_results(&reported, &summary)?;
    Ok(!schema.has_errors())
}

fn report(
    schema: &Schema,
    documents: usize,
    min_severity: Severity,
) -> (Vec<ReportedFinding<'_>>, CheckSummary) {
    let collector = schema.findings();
    let modules = schema
        .arena()
        .roots()
        .filter(|root| root.owner().is_none())
        .count();
    let mut summary = CheckSummary::new(documents, modules);

    let mut reported: Vec<ReportedFinding<'_>> = collector
        .filter_by_severity(min_severity)
        .into_iter()
        .filter_map(|finding| {
            let severity = collector.severity_of(finding)?;
            summary.record(severity);
            Some(ReportedFinding { finding, severity })
        })
        .collect();
    reported.sort_by(|a, b| b.severity.cmp(&a.severity));
    (reported, summary)
}
