//! Findings: structured diagnostics produced while building and resolving
//! statement trees
//!
//! Nothing in the engine throws on malformed input. Every problem becomes a
//! [`Finding`] that names its target (a statement node, a raw document
//! element, or nothing in particular), a [`FindingKind`] and a message.
//! Findings are collected by a caller-owned [`FindingCollector`]; statement
//! nodes additionally keep the findings that target them.

mod collector;

pub use collector::{DefaultFindingCollector, FindingCollector, SeverityPolicy};

use crate::statement::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Severity levels for findings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational messages
    Info,
    /// Hints for improving a model
    Hint,
    /// Something likely to cause problems downstream
    Warning,
    /// The model cannot work properly
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// The category of a finding
///
/// Codes follow the numbering used by existing YANG tooling so that reports
/// and severity overrides stay familiar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    Unspecified,
    FailFast,
    InvalidRootStatement,
    InvalidSyntax,
    IllegalChildStatement,
    MissingRequiredChild,
    InvalidExtension,
    UnresolvablePrefix,
    UnresolvableImport,
    UnresolvableInclude,
    UnresolvableBelongsTo,
    OrphanSubmodule,
    CardinalityViolation,
    InvalidIdentifier,
    InvalidValue,
    FeatureCannotBeSupported,
    EmptyDocumentation,
    InvalidStatus,
    IllegalIfFeatureSyntax,
    UnresolvableDerivedType,
    IdentityCycle,
    UnresolvableGrouping,
    EnumWithoutValue,
    BitWithoutPosition,
    InvalidDeviateProperty,
}

impl FindingKind {
    pub const ALL: [FindingKind; 25] = [
        FindingKind::Unspecified,
        FindingKind::FailFast,
        FindingKind::InvalidRootStatement,
        FindingKind::InvalidSyntax,
        FindingKind::IllegalChildStatement,
        FindingKind::MissingRequiredChild,
        FindingKind::InvalidExtension,
        FindingKind::UnresolvablePrefix,
        FindingKind::UnresolvableImport,
        FindingKind::UnresolvableInclude,
        FindingKind::UnresolvableBelongsTo,
        FindingKind::OrphanSubmodule,
        FindingKind::CardinalityViolation,
        FindingKind::InvalidIdentifier,
        FindingKind::InvalidValue,
        FindingKind::FeatureCannotBeSupported,
        FindingKind::EmptyDocumentation,
        FindingKind::InvalidStatus,
        FindingKind::IllegalIfFeatureSyntax,
        FindingKind::UnresolvableDerivedType,
        FindingKind::IdentityCycle,
        FindingKind::UnresolvableGrouping,
        FindingKind::EnumWithoutValue,
        FindingKind::BitWithoutPosition,
        FindingKind::InvalidDeviateProperty,
    ];

    /// Short stable code, used in reports and severity overrides
    pub fn code(&self) -> &'static str {
        match self {
            FindingKind::Unspecified => "P000",
            FindingKind::FailFast => "P009",
            FindingKind::InvalidRootStatement => "P013",
            FindingKind::InvalidSyntax => "P015",
            FindingKind::IllegalChildStatement => "P018",
            FindingKind::MissingRequiredChild => "P019",
            FindingKind::InvalidExtension => "P025",
            FindingKind::UnresolvablePrefix => "P033",
            FindingKind::UnresolvableImport => "P034",
            FindingKind::UnresolvableInclude => "P037",
            FindingKind::UnresolvableBelongsTo => "P039",
            FindingKind::OrphanSubmodule => "P048",
            FindingKind::CardinalityViolation => "P051",
            FindingKind::InvalidIdentifier => "P052",
            FindingKind::InvalidValue => "P053",
            FindingKind::FeatureCannotBeSupported => "P086",
            FindingKind::EmptyDocumentation => "P101",
            FindingKind::InvalidStatus => "P102",
            FindingKind::IllegalIfFeatureSyntax => "P103",
            FindingKind::UnresolvableDerivedType => "P113",
            FindingKind::IdentityCycle => "P130",
            FindingKind::UnresolvableGrouping => "P121",
            FindingKind::EnumWithoutValue => "P143",
            FindingKind::BitWithoutPosition => "P144",
            FindingKind::InvalidDeviateProperty => "P167",
        }
    }

    /// Look up a kind by its code (`"P018"`)
    pub fn from_code(code: &str) -> Option<FindingKind> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }

    /// Severity used when no override is configured
    pub fn default_severity(&self) -> Severity {
        match self {
            FindingKind::EmptyDocumentation => Severity::Warning,
            FindingKind::OrphanSubmodule => Severity::Warning,
            FindingKind::EnumWithoutValue => Severity::Warning,
            FindingKind::BitWithoutPosition => Severity::Warning,
            FindingKind::Unspecified => Severity::Warning,
            FindingKind::FailFast => Severity::Info,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A reference to a document element, used for reporting
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    /// Name of the document the element came from
    pub source: Option<Arc<str>>,
    /// Element (statement) name as written, including any prefix
    pub name: String,
    /// 1-based line, when the tokenizer supplied one
    pub line: Option<u32>,
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, self.line) {
            (Some(source), Some(line)) => write!(f, "{}:{} '{}'", source, line, self.name),
            (Some(source), None) => write!(f, "{} '{}'", source, self.name),
            (None, Some(line)) => write!(f, "line {} '{}'", line, self.name),
            (None, None) => write!(f, "'{}'", self.name),
        }
    }
}

/// What a finding is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FindingTarget {
    /// A statement that exists in the tree
    Statement { node: NodeId, element: ElementRef },
    /// A document element that never became a statement
    Element(ElementRef),
    /// Not tied to a single place (registry-level problems)
    General,
}

impl FindingTarget {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            FindingTarget::Statement { node, .. } => Some(*node),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&ElementRef> {
        match self {
            FindingTarget::Statement { element, .. } | FindingTarget::Element(element) => {
                Some(element)
            }
            FindingTarget::General => None,
        }
    }
}

/// A single finding
///
/// Equality and hashing cover target, kind and message, so a set of findings
/// collapses exact duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub target: FindingTarget,
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    pub fn new(target: FindingTarget, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            target,
            kind,
            message: message.into(),
        }
    }

    /// Finding that is not attached to any statement or element
    pub fn general(kind: FindingKind, message: impl Into<String>) -> Self {
        Self::new(FindingTarget::General, kind, message)
    }

    /// Rewrite statement ids after the tree holding them was merged into
    /// another arena
    pub(crate) fn shift_nodes(&mut self, offset: u32) {
        if let FindingTarget::Statement { node, .. } = &mut self.target {
            *node = node.shifted(offset);
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target.element() {
            Some(element) => write!(f, "[{}] {} ({})", self.kind, self.message, element),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}
