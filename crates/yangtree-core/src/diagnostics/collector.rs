//! Finding collection
//!
//! The engine reports every finding through a [`FindingCollector`]. The
//! default collector keeps findings in insertion order, collapses duplicates
//! and applies a [`SeverityPolicy`] (per-kind overrides, suppression).

use super::{Finding, FindingKind, Severity};
use crate::statement::NodeId;
use indexmap::IndexSet;
use std::collections::HashMap;

/// Maps finding kinds to severities, or suppresses them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeverityPolicy {
    /// `None` switches a kind off
    overrides: HashMap<FindingKind, Option<Severity>>,
}

impl SeverityPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `severity` for `kind` instead of its default
    pub fn set(&mut self, kind: FindingKind, severity: Severity) {
        self.overrides.insert(kind, Some(severity));
    }

    /// Never record findings of `kind`
    pub fn suppress(&mut self, kind: FindingKind) {
        self.overrides.insert(kind, None);
    }

    /// Effective severity of a kind; `None` when suppressed
    pub fn severity_of(&self, kind: FindingKind) -> Option<Severity> {
        match self.overrides.get(&kind) {
            Some(configured) => *configured,
            None => Some(kind.default_severity()),
        }
    }

    pub fn is_suppressed(&self, kind: FindingKind) -> bool {
        self.severity_of(kind).is_none()
    }
}

/// Trait for collecting findings
pub trait FindingCollector {
    /// Record a finding. Returns `false` when it was a duplicate or suppressed.
    fn add(&mut self, finding: Finding) -> bool;

    /// Record several findings
    fn add_all(&mut self, findings: Vec<Finding>) {
        for finding in findings {
            self.add(finding);
        }
    }

    /// All recorded findings, in the order they were first reported
    fn findings(&self) -> Vec<&Finding>;

    /// Severity a recorded finding is reported with
    fn severity_of(&self, finding: &Finding) -> Option<Severity>;

    /// Clear all collected findings
    fn clear(&mut self);

    /// Filter findings by minimum severity level
    fn filter_by_severity(&self, min_severity: Severity) -> Vec<&Finding> {
        self.findings()
            .into_iter()
            .filter(|f| self.severity_of(f).is_some_and(|s| s >= min_severity))
            .collect()
    }

    /// Findings of one kind
    fn findings_of_kind(&self, kind: FindingKind) -> Vec<&Finding> {
        self.findings()
            .into_iter()
            .filter(|f| f.kind == kind)
            .collect()
    }

    /// Findings attached to a statement node
    fn findings_for_statement(&self, node: NodeId) -> Vec<&Finding> {
        self.findings()
            .into_iter()
            .filter(|f| f.target.node() == Some(node))
            .collect()
    }

    /// Group findings by kind
    fn group_by_kind(&self) -> HashMap<FindingKind, Vec<&Finding>> {
        let mut groups: HashMap<FindingKind, Vec<&Finding>> = HashMap::new();
        for finding in self.findings() {
            groups.entry(finding.kind).or_default().push(finding);
        }
        groups
    }

    /// Get count of findings by severity
    fn count_by_severity(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for finding in self.findings() {
            if let Some(severity) = self.severity_of(finding) {
                *counts.entry(severity).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Check if there are any errors
    fn has_errors(&self) -> bool {
        self.findings()
            .into_iter()
            .any(|f| self.severity_of(f) == Some(Severity::Error))
    }

    /// Get total count of findings
    fn total_count(&self) -> usize {
        self.findings().len()
    }
}

/// Default implementation of FindingCollector
#[derive(Debug, Clone, Default)]
pub struct DefaultFindingCollector {
    findings: IndexSet<Finding>,
    policy: SeverityPolicy,
}

impl DefaultFindingCollector {
    /// Create a new collector using default severities
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collector applying the given severity policy
    pub fn with_policy(policy: SeverityPolicy) -> Self {
        Self {
            findings: IndexSet::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &SeverityPolicy {
        &self.policy
    }

    /// Take all findings out, leaving the collector empty
    pub fn drain(&mut self) -> Vec<Finding> {
        self.findings.drain(..).collect()
    }

    /// Keep only the findings for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&Finding) -> bool) {
        self.findings.retain(|f| keep(f));
    }

    /// Sort findings so errors come first, keeping report order otherwise
    pub fn sort_by_severity(&mut self) {
        let policy = self.policy.clone();
        self.findings.sort_by(|a, b| {
            let sa = policy.severity_of(a.kind);
            let sb = policy.severity_of(b.kind);
            sb.cmp(&sa)
        });
    }
}

impl FindingCollector for DefaultFindingCollector {
    fn add(&mut self, finding: Finding) -> bool {
        if self.policy.is_suppressed(finding.kind) {
            return false;
        }
        self.findings.insert(finding)
    }

    fn findings(&self) -> Vec<&Finding> {
        self.findings.iter().collect()
    }

    fn severity_of(&self, finding: &Finding) -> Option<Severity> {
        self.policy.severity_of(finding.kind)
    }

    fn clear(&mut self) {
        self.findings.clear();
    }

    fn total_count(&self) -> usize {
        self.findings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(kind: FindingKind, message: &str) -> Finding {
        Finding::general(kind, message)
    }

    #[test]
    fn test_duplicates_are_collapsed() {
        let mut collector = DefaultFindingCollector::new();
        assert!(collector.add(finding(FindingKind::InvalidSyntax, "x")));
        assert!(!collector.add(finding(FindingKind::InvalidSyntax, "x")));
        assert!(collector.add(finding(FindingKind::InvalidSyntax, "y")));
        assert_eq!(collector.total_count(), 2);
    }

    #[test]
    fn test_suppressed_kinds_are_dropped() {
        let mut policy = SeverityPolicy::new();
        policy.suppress(FindingKind::EmptyDocumentation);
        let mut collector = DefaultFindingCollector::with_policy(policy);

        assert!(!collector.add(finding(FindingKind::EmptyDocumentation, "empty")));
        assert_eq!(collector.total_count(), 0);
    }

    #[test]
    fn test_filter_and_counts_use_overrides() {
        let mut policy = SeverityPolicy::new();
        policy.set(FindingKind::InvalidIdentifier, Severity::Info);
        let mut collector = DefaultFindingCollector::with_policy(policy);

        collector.add(finding(FindingKind::InvalidIdentifier, "bad id"));
        collector.add(finding(FindingKind::MissingRequiredChild, "missing"));
        collector.add(finding(FindingKind::EmptyDocumentation, "empty"));

        assert_eq!(collector.filter_by_severity(Severity::Warning).len(), 2);
        assert_eq!(collector.filter_by_severity(Severity::Error).len(), 1);

        let counts = collector.count_by_severity();
        assert_eq!(counts.get(&Severity::Info), Some(&1));
        assert_eq!(counts.get(&Severity::Warning), Some(&1));
        assert_eq!(counts.get(&Severity::Error), Some(&1));
        assert!(collector.has_errors());
    }

    #[test]
    fn test_sort_by_severity_puts_errors_first() {
        let mut collector = DefaultFindingCollector::new();
        collector.add(finding(FindingKind::EmptyDocumentation, "w"));
        collector.add(finding(FindingKind::InvalidSyntax, "e"));
        collector.sort_by_severity();

        let ordered = collector.findings();
        assert_eq!(ordered[0].kind, FindingKind::InvalidSyntax);
        assert_eq!(ordered[1].kind, FindingKind::EmptyDocumentation);
    }

    #[test]
    fn test_group_by_kind() {
        let mut collector = DefaultFindingCollector::new();
        collector.add(finding(FindingKind::InvalidSyntax, "a"));
        collector.add(finding(FindingKind::InvalidSyntax, "b"));
        collector.add(finding(FindingKind::UnresolvablePrefix, "c"));

        let groups = collector.group_by_kind();
        assert_eq!(groups[&FindingKind::InvalidSyntax].len(), 2);
        assert_eq!(groups[&FindingKind::UnresolvablePrefix].len(), 1);
    }
}
