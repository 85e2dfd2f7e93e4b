//! Statement identity: which module defines a statement, and its name

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Name of the pseudo-module owning all core-language statements
pub const CORE_MODULE_NAME: &str = "YANG CORE";

/// Module name, cheap to clone
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// The pseudo-module of core statements
    pub fn core() -> Self {
        Self::new(CORE_MODULE_NAME)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_core(&self) -> bool {
        &*self.0 == CORE_MODULE_NAME
    }
}

impl Default for ModuleId {
    fn default() -> Self {
        Self::new("")
    }
}

impl From<&str> for ModuleId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModuleId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(owning module, statement name)`
///
/// Core statements live in the [`CORE_MODULE_NAME`] pseudo-module, so a core
/// `leaf` and an extension named `leaf` never compare equal. Both fields take
/// part in equality and in the hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatementKey {
    owning_module: ModuleId,
    name: String,
}

impl StatementKey {
    pub fn new(owning_module: ModuleId, name: impl Into<String>) -> Self {
        Self {
            owning_module,
            name: name.into(),
        }
    }

    /// Key of a core-language statement
    pub fn core(name: impl Into<String>) -> Self {
        Self::new(ModuleId::core(), name)
    }

    pub fn owning_module(&self) -> &ModuleId {
        &self.owning_module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_core(&self) -> bool {
        self.owning_module.is_core()
    }

    pub fn is_extension(&self) -> bool {
        !self.is_core()
    }
}

impl fmt::Display for StatementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_core() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.owning_module, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_core_and_extension_with_same_name_differ() {
        let core = StatementKey::core("label");
        let ext = StatementKey::new(ModuleId::new("o-ran-smo-teiv-common-yang-extensions"), "label");

        assert_ne!(core, ext);
        assert!(core.is_core());
        assert!(ext.is_extension());

        let set: HashSet<_> = [core.clone(), ext.clone(), core.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_display() {
        assert_eq!(StatementKey::core("leaf").to_string(), "leaf");
        assert_eq!(
            StatementKey::new(ModuleId::new("ietf-netconf-acm"), "default-deny-write").to_string(),
            "ietf-netconf-acm:default-deny-write"
        );
    }
}
