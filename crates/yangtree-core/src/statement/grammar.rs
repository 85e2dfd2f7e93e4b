//! Child-cardinality tables consumed by the builder
//!
//! For every core statement the builder asks which children must appear
//! exactly once, at least once, at most once, or any number of times. The
//! engine does not hard-code those answers: any [`GrammarTable`] can be
//! plugged in. [`Rfc7950Grammar`] covers the commonly used core statements;
//! [`MapGrammar`] holds a table loaded from JSON or YAML, or derived from the
//! built-in one and then adjusted.

use crate::error::YangError;
use crate::result::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

/// The four child lists of one statement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cardinalities {
    #[serde(default)]
    pub mandatory_singleton: Vec<String>,
    #[serde(default)]
    pub mandatory_multiple: Vec<String>,
    #[serde(default)]
    pub optional_singleton: Vec<String>,
    #[serde(default)]
    pub optional_multiple: Vec<String>,
}

impl Cardinalities {
    pub fn new(
        mandatory_singleton: &[&str],
        mandatory_multiple: &[&str],
        optional_singleton: &[&str],
        optional_multiple: &[&str],
    ) -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            mandatory_singleton: owned(mandatory_singleton),
            mandatory_multiple: owned(mandatory_multiple),
            optional_singleton: owned(optional_singleton),
            optional_multiple: owned(optional_multiple),
        }
    }

    /// Whether `name` appears in any of the four lists
    pub fn allows(&self, name: &str) -> bool {
        [
            &self.mandatory_singleton,
            &self.mandatory_multiple,
            &self.optional_singleton,
            &self.optional_multiple,
        ]
        .iter()
        .any(|list| list.iter().any(|n| n == name))
    }

    pub fn is_empty(&self) -> bool {
        self.mandatory_singleton.is_empty()
            && self.mandatory_multiple.is_empty()
            && self.optional_singleton.is_empty()
            && self.optional_multiple.is_empty()
    }
}

/// Source of child cardinalities for core statements
pub trait GrammarTable: Send + Sync {
    /// Cardinalities for the statement `name`; `None` means no children are
    /// allowed at all
    fn cardinalities(&self, name: &str) -> Option<&Cardinalities>;
}

/// Grammar table held in memory, loadable from JSON or YAML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapGrammar {
    #[serde(default)]
    statements: BTreeMap<String, Cardinalities>,
}

impl MapGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the built-in table, ready to be adjusted
    pub fn rfc7950() -> Self {
        Self {
            statements: RFC7950
                .iter()
                .map(|(name, c)| (name.to_string(), c.clone()))
                .collect(),
        }
    }

    /// Set the cardinalities of one statement
    pub fn with_statement(mut self, name: impl Into<String>, cardinalities: Cardinalities) -> Self {
        self.insert(name, cardinalities);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, cardinalities: Cardinalities) {
        self.statements.insert(name.into(), cardinalities);
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| YangError::grammar_error(e.to_string()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| YangError::grammar_error(e.to_string()))
    }

    /// Load a table from a `.json`, `.yaml` or `.yml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| YangError::io_error(path, e))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Err(YangError::grammar_error(format!(
                "Unsupported grammar file extension: {}",
                path.display()
            ))),
        }
    }
}

impl GrammarTable for MapGrammar {
    fn cardinalities(&self, name: &str) -> Option<&Cardinalities> {
        self.statements.get(name)
    }
}

/// Built-in table for the core statements of YANG 1.1
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc7950Grammar;

impl GrammarTable for Rfc7950Grammar {
    fn cardinalities(&self, name: &str) -> Option<&Cardinalities> {
        RFC7950.get(name)
    }
}

const DATA_DEF: &[&str] = &[
    "container", "leaf", "leaf-list", "list", "choice", "anydata", "anyxml", "uses",
];
const META: &[&str] = &["description", "reference"];
const STATUS_META: &[&str] = &["status", "description", "reference"];
const LINKAGE_AND_BODY: &[&str] = &[
    "import", "include", "revision", "extension", "feature", "identity", "typedef", "grouping",
    "container", "leaf", "leaf-list", "list", "choice", "anydata", "anyxml", "uses", "augment",
    "rpc", "notification", "deviation",
];
const HEADER_META: &[&str] = &["yang-version", "organization", "contact", "description", "reference"];
const ERROR_INFO: &[&str] = &["error-message", "error-app-tag", "description", "reference"];

const LEAF_STATEMENTS: &[&str] = &[
    "base", "config", "contact", "default", "description", "error-app-tag", "error-message",
    "fraction-digits", "if-feature", "key", "mandatory", "max-elements", "min-elements",
    "modifier", "namespace", "ordered-by", "organization", "path", "position", "prefix",
    "presence", "reference", "require-instance", "revision-date", "status", "unique", "units",
    "value", "yang-version", "yin-element",
];

fn join(parts: &[&[&'static str]]) -> Vec<&'static str> {
    parts.concat()
}

static RFC7950: LazyLock<HashMap<&'static str, Cardinalities>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    let mut add = |name: &'static str, ms: &[&str], mm: &[&str], os: &[&str], om: &[&str]| {
        table.insert(name, Cardinalities::new(ms, mm, os, om));
    };

    // header and linkage
    add("module", &["namespace", "prefix"], &[], HEADER_META, LINKAGE_AND_BODY);
    add("submodule", &["belongs-to"], &[], HEADER_META, LINKAGE_AND_BODY);
    add("belongs-to", &["prefix"], &[], &[], &[]);
    add("import", &["prefix"], &[], &join(&[&["revision-date"], META]), &[]);
    add("include", &[], &[], &join(&[&["revision-date"], META]), &[]);
    add("revision", &[], &[], META, &[]);

    add("extension", &[], &[], &join(&[&["argument"], STATUS_META]), &[]);
    add("argument", &[], &[], &["yin-element"], &[]);
    add("feature", &[], &[], STATUS_META, &["if-feature"]);
    add("identity", &[], &[], STATUS_META, &["if-feature", "base"]);

    // types
    add("typedef", &["type"], &[], &join(&[&["units", "default"], STATUS_META]), &[]);
    add(
        "type",
        &[],
        &[],
        &["fraction-digits", "length", "path", "range", "require-instance"],
        &["base", "bit", "enum", "pattern", "type"],
    );
    add("enum", &[], &[], &join(&[&["value"], STATUS_META]), &["if-feature"]);
    add("bit", &[], &[], &join(&[&["position"], STATUS_META]), &["if-feature"]);
    add("length", &[], &[], ERROR_INFO, &[]);
    add("range", &[], &[], ERROR_INFO, &[]);
    add("pattern", &[], &[], &join(&[&["modifier"], ERROR_INFO]), &[]);
    add("must", &[], &[], ERROR_INFO, &[]);
    add("when", &[], &[], META, &[]);

    // data definitions
    add(
        "container",
        &[],
        &[],
        &join(&[&["when", "presence", "config"], STATUS_META]),
        &join(&[&["if-feature", "must", "typedef", "grouping"], DATA_DEF, &["action", "notification"]]),
    );
    add(
        "leaf",
        &["type"],
        &[],
        &join(&[&["when", "units", "default", "config", "mandatory"], STATUS_META]),
        &["if-feature", "must"],
    );
    add(
        "leaf-list",
        &["type"],
        &[],
        &join(&[
            &["when", "units", "config", "min-elements", "max-elements", "ordered-by"],
            STATUS_META,
        ]),
        &["if-feature", "must", "default"],
    );
    add(
        "list",
        &[],
        &[],
        &join(&[
            &["when", "key", "config", "min-elements", "max-elements", "ordered-by"],
            STATUS_META,
        ]),
        &join(&[
            &["if-feature", "must", "unique", "typedef", "grouping"],
            DATA_DEF,
            &["action", "notification"],
        ]),
    );
    add(
        "choice",
        &[],
        &[],
        &join(&[&["when", "default", "config", "mandatory"], STATUS_META]),
        &["if-feature", "case", "container", "leaf", "leaf-list", "list", "choice", "anydata", "anyxml"],
    );
    add("case", &[], &[], &join(&[&["when"], STATUS_META]), &join(&[&["if-feature"], DATA_DEF]));
    for any in ["anydata", "anyxml"] {
        add(
            any,
            &[],
            &[],
            &join(&[&["when", "config", "mandatory"], STATUS_META]),
            &["if-feature", "must"],
        );
    }
    add(
        "grouping",
        &[],
        &[],
        STATUS_META,
        &join(&[&["typedef", "grouping"], DATA_DEF, &["action", "notification"]]),
    );
    add("uses", &[], &[], &join(&[&["when"], STATUS_META]), &["if-feature", "refine", "augment"]);
    add(
        "refine",
        &[],
        &[],
        &join(&[
            &["presence", "config", "mandatory", "min-elements", "max-elements"],
            META,
        ]),
        &["if-feature", "must", "default"],
    );
    add(
        "augment",
        &[],
        &[],
        &join(&[&["when"], STATUS_META]),
        &join(&[&["if-feature"], DATA_DEF, &["case", "action", "notification"]]),
    );

    // operations
    for operation in ["rpc", "action"] {
        add(
            operation,
            &[],
            &[],
            &join(&[STATUS_META, &["input", "output"]]),
            &["if-feature", "typedef", "grouping"],
        );
    }
    for io in ["input", "output"] {
        add(io, &[], &[], &[], &join(&[&["must", "typedef", "grouping"], DATA_DEF]));
    }
    add(
        "notification",
        &[],
        &[],
        STATUS_META,
        &join(&[&["if-feature", "must", "typedef", "grouping"], DATA_DEF]),
    );

    // deviations
    add("deviation", &[], &["deviate"], META, &[]);
    add(
        "deviate",
        &[],
        &[],
        &["units", "config", "mandatory", "min-elements", "max-elements", "type"],
        &["must", "unique", "default"],
    );

    for name in LEAF_STATEMENTS {
        add(*name, &[], &[], &[], &[]);
    }
    table
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::CoreKind;

    #[test]
    fn test_builtin_covers_every_core_kind() {
        for kind in CoreKind::ALL {
            assert!(
                Rfc7950Grammar.cardinalities(kind.keyword()).is_some(),
                "missing {}",
                kind
            );
        }
    }

    #[test]
    fn test_leaf_requires_type() {
        let leaf = Rfc7950Grammar.cardinalities("leaf").unwrap();
        assert_eq!(leaf.mandatory_singleton, vec!["type".to_string()]);
        assert!(leaf.allows("must"));
        assert!(!leaf.allows("leaf"));
    }

    #[test]
    fn test_map_grammar_from_yaml() {
        let grammar = MapGrammar::from_yaml_str(
            r#"
statements:
  list:
    mandatorySingleton: [key]
    optionalMultiple: [leaf]
"#,
        )
        .unwrap();
        let list = grammar.cardinalities("list").unwrap();
        assert_eq!(list.mandatory_singleton, vec!["key".to_string()]);
        assert!(list.optional_singleton.is_empty());
        assert!(grammar.cardinalities("leaf").is_none());
    }

    #[test]
    fn test_rfc7950_copy_can_be_adjusted() {
        let grammar = MapGrammar::rfc7950()
            .with_statement("list", Cardinalities::new(&["key"], &[], &[], &["leaf"]));
        assert_eq!(grammar.len(), CoreKind::ALL.len());
        assert!(grammar.cardinalities("list").unwrap().allows("key"));
        assert!(!grammar.cardinalities("list").unwrap().allows("container"));
    }

    #[test]
    fn test_invalid_grammar_is_grammar_error() {
        let err = MapGrammar::from_json_str("{ \"statements\": 3 }").unwrap_err();
        assert!(matches!(err, YangError::GrammarError { .. }));
    }
}
