//! Engine configuration types

use crate::diagnostics::{FindingKind, Severity, SeverityPolicy};
use crate::error::YangError;
use crate::result::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Severity as written in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    /// Do not record the finding
    Off,
    Info,
    Hint,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl FindingSeverity {
    /// The severity this level stands for; `None` for `off`
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            FindingSeverity::Off => None,
            FindingSeverity::Info => Some(Severity::Info),
            FindingSeverity::Hint => Some(Severity::Hint),
            FindingSeverity::Warn => Some(Severity::Warning),
            FindingSeverity::Error => Some(Severity::Error),
        }
    }
}

/// What the namespace of a submodule without loaded owner resolves to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OrphanSubmodulePolicy {
    /// Namespace stays unset, nothing is reported
    #[default]
    ResolveToNone,
    /// Namespace stays unset and an orphan-submodule finding is reported
    EmitFinding,
}

/// Engine configuration
///
/// Every field is optional; accessors supply the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfiguration {
    /// Stop at the first finding of at least this severity
    #[schemars(description = "Abort processing at the first finding of at least this severity")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<FindingSeverity>,

    /// Features to support, as `module:feature`
    #[schemars(description = "Supported features as 'module:feature'; absent means all features")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_features: Option<Vec<String>>,

    /// Remove schema nodes whose if-feature conditions do not hold
    #[schemars(description = "Remove schema nodes whose if-feature conditions are not satisfied")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_nodes_not_satisfying_if_feature: Option<bool>,

    /// Handling of submodules whose module is not loaded
    #[schemars(description = "Namespace handling for submodules whose owning module is not loaded")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orphan_submodule_policy: Option<OrphanSubmodulePolicy>,

    /// Per-code severity overrides, e.g. `P018: warn`
    #[schemars(description = "Severity overrides keyed by finding code, e.g. P018")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_overrides: Option<BTreeMap<String, FindingSeverity>>,

    /// Finding codes that are never recorded
    #[schemars(description = "Finding codes that are never recorded")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppressed_findings: Option<Vec<String>>,

    /// Build independent documents in parallel
    #[schemars(description = "Build independent documents in parallel")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
}

impl EngineConfiguration {
    /// Load configuration from a JSON, TOML or YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| YangError::io_error(path, e))?;
        let parse_error = |e: String| {
            YangError::config_error(format!("Failed to parse '{}': {}", path.display(), e))
        };
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            Some("toml") => toml::from_str(&content).map_err(|e| parse_error(e.to_string()))?,
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))?
            }
            _ => {
                return Err(YangError::config_error(format!(
                    "Unsupported config file extension (expected .json, .toml, .yaml or .yml): {}",
                    path.display()
                )));
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject finding codes that do not exist
    pub fn validate(&self) -> Result<()> {
        let codes = self
            .severity_overrides
            .iter()
            .flat_map(|m| m.keys())
            .chain(self.suppressed_findings.iter().flatten());
        for code in codes {
            if FindingKind::from_code(code).is_none() {
                return Err(YangError::config_error(format!("Unknown finding code: {code}")));
            }
        }
        Ok(())
    }

    pub fn fail_fast(&self) -> Option<Severity> {
        self.fail_fast.and_then(FindingSeverity::to_severity)
    }

    /// `None` means every feature is supported
    pub fn supported_features(&self) -> Option<&[String]> {
        self.supported_features.as_deref()
    }

    pub fn remove_nodes_not_satisfying_if_feature(&self) -> bool {
        self.remove_nodes_not_satisfying_if_feature.unwrap_or(false)
    }

    pub fn orphan_submodule_policy(&self) -> OrphanSubmodulePolicy {
        self.orphan_submodule_policy.unwrap_or_default()
    }

    pub fn parallel(&self) -> bool {
        self.parallel.unwrap_or(true)
    }

    /// Severity policy built from overrides and suppressions
    pub fn severity_policy(&self) -> Result<SeverityPolicy> {
        self.validate()?;
        let mut policy = SeverityPolicy::new();
        for (code, level) in self.severity_overrides.iter().flatten() {
            let Some(kind) = FindingKind::from_code(code) else {
                continue;
            };
            match level.to_severity() {
                Some(severity) => policy.set(kind, severity),
                None => policy.suppress(kind),
            }
        }
        for code in self.suppressed_findings.iter().flatten() {
            if let Some(kind) = FindingKind::from_code(code) {
                policy.suppress(kind);
            }
        }
        Ok(policy)
    }

    /// JSON schema of the configuration file
    pub fn json_schema() -> serde_json::Value {
        let schema = schemars::schema_for!(EngineConfiguration);
        serde_json::to_value(&schema).unwrap_or_default()
    }

    /// Starter configuration written by `config init`
    pub fn template() -> Self {
        Self {
            fail_fast: None,
            supported_features: None,
            remove_nodes_not_satisfying_if_feature: Some(false),
            orphan_submodule_policy: Some(OrphanSubmodulePolicy::ResolveToNone),
            severity_overrides: Some(BTreeMap::from([(
                FindingKind::EmptyDocumentation.code().to_string(),
                FindingSeverity::Warn,
            )])),
            suppressed_findings: None,
            parallel: Some(true),
        }
    }
}
