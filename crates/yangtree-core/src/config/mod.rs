//! Configuration of the statement tree engine
//!
//! Configuration files are discovered by walking up from the working
//! directory (see [`ConfigLoader`]). JSON, TOML and YAML are accepted.
//!
//! ## Example Configuration (yangtree.yaml)
//!
//! ```yaml
//! failFast: error
//! supportedFeatures:
//!   - acme-system:ntp
//!   - acme-system:radius
//! removeNodesNotSatisfyingIfFeature: true
//! orphanSubmodulePolicy: emitFinding
//! severityOverrides:
//!   P101: off
//!   P018: warn
//! suppressedFindings:
//!   - P048
//! parallel: true
//! ```

mod engine_config;
mod loader;

pub use engine_config::{EngineConfiguration, FindingSeverity, OrphanSubmodulePolicy};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
