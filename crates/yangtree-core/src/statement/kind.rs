//! Core-language statement kinds
//!
//! The set of core statements is closed, so it is an enum. Each kind knows
//! its keyword, what its argument must look like and a few behavioural
//! flags used by the effective-attribute pass.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// What a statement's argument must look like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentRule {
    /// Non-null and non-empty after trimming
    Required,
    /// Non-null, may be empty (`default ""`)
    Present,
    /// No argument allowed
    None,
    /// `true` or `false`
    Boolean,
    /// A YANG identifier
    Identifier,
    /// A possibly prefixed YANG identifier
    IdentifierRef,
    /// One of a fixed set of keywords
    Keyword(&'static [&'static str]),
    /// `current`, `deprecated` or `obsolete`
    Status,
    /// `YYYY-MM-DD`
    Date,
    /// Integer in an inclusive range
    Integer { min: i64, max: i64 },
    /// Positive integer or `unbounded`
    MaxElements,
    /// Free text that should not be empty
    Documentation,
    /// An if-feature boolean expression
    IfFeature,
}

macro_rules! core_kinds {
    (
        $(
            $(#[$arm_attr:meta])*
            $variant:ident => $keyword:literal, $rule:expr;
        )+
    ) => {
        /// A statement of the core modelling language
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum CoreKind {
            $(
                $(#[$arm_attr])*
                $variant,
            )+
        }

        impl CoreKind {
            /// Every core kind, in keyword order
            pub const ALL: &'static [CoreKind] = &[$(CoreKind::$variant),+];

            /// The statement keyword as written in a module
            pub fn keyword(&self) -> &'static str {
                match self {
                    $(CoreKind::$variant => $keyword,)+
                }
            }

            /// Constraint on the statement argument
            pub fn argument_rule(&self) -> ArgumentRule {
                match self {
                    $(CoreKind::$variant => $rule,)+
                }
            }
        }
    };
}

const BOOLEAN: ArgumentRule = ArgumentRule::Boolean;
const IDENTIFIER: ArgumentRule = ArgumentRule::Identifier;
const REQUIRED: ArgumentRule = ArgumentRule::Required;
const DOCUMENTATION: ArgumentRule = ArgumentRule::Documentation;

core_kinds! {
    Action => "action", IDENTIFIER;
    Anydata => "anydata", IDENTIFIER;
    Anyxml => "anyxml", IDENTIFIER;
    Argument => "argument", IDENTIFIER;
    Augment => "augment", REQUIRED;
    Base => "base", ArgumentRule::IdentifierRef;
    BelongsTo => "belongs-to", IDENTIFIER;
    Bit => "bit", IDENTIFIER;
    Case => "case", IDENTIFIER;
    Choice => "choice", IDENTIFIER;
    Config => "config", BOOLEAN;
    Contact => "contact", DOCUMENTATION;
    Container => "container", IDENTIFIER;
    Default => "default", ArgumentRule::Present;
    Description => "description", DOCUMENTATION;
    Deviate => "deviate", ArgumentRule::Keyword(&["not-supported", "add", "replace", "delete"]);
    Deviation => "deviation", REQUIRED;
    Enum => "enum", REQUIRED;
    ErrorAppTag => "error-app-tag", REQUIRED;
    ErrorMessage => "error-message", DOCUMENTATION;
    Extension => "extension", IDENTIFIER;
    Feature => "feature", IDENTIFIER;
    FractionDigits => "fraction-digits", ArgumentRule::Integer { min: 1, max: 18 };
    Grouping => "grouping", IDENTIFIER;
    Identity => "identity", IDENTIFIER;
    IfFeature => "if-feature", ArgumentRule::IfFeature;
    Import => "import", IDENTIFIER;
    Include => "include", IDENTIFIER;
    Input => "input", ArgumentRule::None;
    Key => "key", REQUIRED;
    Leaf => "leaf", IDENTIFIER;
    LeafList => "leaf-list", IDENTIFIER;
    Length => "length", REQUIRED;
    List => "list", IDENTIFIER;
    Mandatory => "mandatory", BOOLEAN;
    MaxElements => "max-elements", ArgumentRule::MaxElements;
    MinElements => "min-elements", ArgumentRule::Integer { min: 0, max: u32::MAX as i64 };
    Modifier => "modifier", ArgumentRule::Keyword(&["invert-match"]);
    Module => "module", IDENTIFIER;
    Must => "must", REQUIRED;
    Namespace => "namespace", REQUIRED;
    Notification => "notification", IDENTIFIER;
    OrderedBy => "ordered-by", ArgumentRule::Keyword(&["system", "user"]);
    Organization => "organization", DOCUMENTATION;
    Output => "output", ArgumentRule::None;
    Path => "path", REQUIRED;
    Pattern => "pattern", ArgumentRule::Present;
    Position => "position", ArgumentRule::Integer { min: 0, max: u32::MAX as i64 };
    Prefix => "prefix", IDENTIFIER;
    Presence => "presence", REQUIRED;
    Range => "range", REQUIRED;
    Reference => "reference", DOCUMENTATION;
    Refine => "refine", REQUIRED;
    RequireInstance => "require-instance", BOOLEAN;
    Revision => "revision", ArgumentRule::Date;
    RevisionDate => "revision-date", ArgumentRule::Date;
    Rpc => "rpc", IDENTIFIER;
    Status => "status", ArgumentRule::Status;
    Submodule => "submodule", IDENTIFIER;
    Type => "type", ArgumentRule::IdentifierRef;
    Typedef => "typedef", IDENTIFIER;
    Unique => "unique", REQUIRED;
    Units => "units", REQUIRED;
    Uses => "uses", ArgumentRule::IdentifierRef;
    Value => "value", ArgumentRule::Integer { min: i32::MIN as i64, max: i32::MAX as i64 };
    When => "when", REQUIRED;
    YangVersion => "yang-version", ArgumentRule::Keyword(&["1", "1.1"]);
    YinElement => "yin-element", BOOLEAN;
}

static KEYWORDS: LazyLock<HashMap<&'static str, CoreKind>> = LazyLock::new(|| {
    CoreKind::ALL
        .iter()
        .map(|kind| (kind.keyword(), *kind))
        .collect()
});

impl CoreKind {
    /// Resolve a keyword to its kind
    pub fn from_keyword(keyword: &str) -> Option<CoreKind> {
        KEYWORDS.get(keyword).copied()
    }

    /// Whether `name` is a keyword of the core language
    pub fn is_core_keyword(name: &str) -> bool {
        KEYWORDS.contains_key(name)
    }

    /// Statements that carry `config false` no matter what they declare
    pub fn forces_config_false(&self) -> bool {
        matches!(self, CoreKind::Action | CoreKind::Rpc | CoreKind::Notification)
    }

    /// Statements whose relative order among siblings of the same kind is
    /// semantically significant
    pub fn order_under_parent_matters(&self) -> bool {
        matches!(self, CoreKind::Default | CoreKind::Type)
    }

    /// Statements defining a node of the schema tree
    pub fn defines_schema_node(&self) -> bool {
        matches!(
            self,
            CoreKind::Action
                | CoreKind::Anydata
                | CoreKind::Anyxml
                | CoreKind::Case
                | CoreKind::Choice
                | CoreKind::Container
                | CoreKind::Input
                | CoreKind::Leaf
                | CoreKind::LeafList
                | CoreKind::List
                | CoreKind::Notification
                | CoreKind::Output
                | CoreKind::Rpc
        )
    }

    /// `module` or `submodule`
    pub fn is_model_root(&self) -> bool {
        matches!(self, CoreKind::Module | CoreKind::Submodule)
    }

    pub fn argument_is_mandatory(&self) -> bool {
        self.argument_rule() != ArgumentRule::None
    }
}

impl fmt::Display for CoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
