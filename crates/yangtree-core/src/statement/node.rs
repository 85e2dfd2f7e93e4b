//! Statement nodes and the values they carry

use super::key::StatementKey;
use super::kind::CoreKind;
use crate::diagnostics::{ElementRef, Finding};
use crate::dom::{DomElement, PrefixResolver};
use crate::extensions::ExtensionClass;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable index of a statement node inside its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub(crate) fn shifted(&self, offset: u32) -> NodeId {
        NodeId(self.0 + offset)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a [`TreeRoot`](super::TreeRoot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootId(pub(crate) u32);

impl RootId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub(crate) fn shifted(&self, offset: u32) -> RootId {
        RootId(self.0 + offset)
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root#{}", self.0)
    }
}

/// Lifecycle status of a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

impl Status {
    pub fn from_keyword(keyword: &str) -> Option<Status> {
        match keyword {
            "current" => Some(Status::Current),
            "deprecated" => Some(Status::Deprecated),
            "obsolete" => Some(Status::Obsolete),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Status::Current => "current",
            Status::Deprecated => "deprecated",
            Status::Obsolete => "obsolete",
        }
    }
}

/// Whether a module is implemented or only imported for its definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConformanceType {
    Implement,
    Import,
}

/// Value stored in a node's custom data
///
/// Cloning follows the cloning rules for statements: lists are copied
/// element by element, `Shared` values keep pointing at the same object.
#[derive(Clone)]
pub enum CustomValue {
    Text(String),
    Bool(bool),
    Int(i64),
    List(Vec<CustomValue>),
    Shared(Arc<dyn Any + Send + Sync>),
}

impl CustomValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CustomValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CustomValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CustomValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CustomValue]> {
        match self {
            CustomValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Downcast a shared value
    pub fn as_shared<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            CustomValue::Shared(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CustomValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            CustomValue::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            CustomValue::Int(value) => f.debug_tuple("Int").field(value).finish(),
            CustomValue::List(items) => f.debug_tuple("List").field(items).finish(),
            CustomValue::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

/// Position of a supplier in the factory's supplier list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierId(pub usize);

/// An extension statement's concrete class and the supplier that provided it
///
/// `supplier` is `None` for the catch-all class used when no supplier
/// recognised the statement.
#[derive(Clone)]
pub struct ExtensionVariant {
    pub supplier: Option<SupplierId>,
    pub class: Arc<dyn ExtensionClass>,
}

impl ExtensionVariant {
    pub fn tag(&self) -> &str {
        self.class.tag()
    }
}

impl fmt::Debug for ExtensionVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionVariant")
            .field("tag", &self.tag())
            .field("supplier", &self.supplier)
            .finish()
    }
}

/// The concrete variant of a statement
#[derive(Debug, Clone)]
pub enum StatementVariant {
    Core(CoreKind),
    Extension(ExtensionVariant),
}

/// One statement in a [`StatementArena`](super::StatementArena)
///
/// Structure (`parent`, `root`, `children`) is only changed through the
/// arena's mutation primitives, which keep the back-references consistent.
#[derive(Debug, Clone)]
pub struct StatementNode {
    pub(crate) key: StatementKey,
    pub(crate) variant: StatementVariant,
    pub(crate) element: Arc<DomElement>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) root: RootId,
    pub(crate) children: Vec<NodeId>,
    pub(crate) effective_namespace: Option<String>,
    pub(crate) effective_status: Status,
    pub(crate) effective_conformance: Option<ConformanceType>,
    pub(crate) effective_config: bool,
    pub(crate) findings: IndexSet<Finding>,
    pub(crate) custom_data: HashMap<String, CustomValue>,
    pub(crate) document_order: Option<usize>,
}

impl StatementNode {
    pub(crate) fn new(
        key: StatementKey,
        variant: StatementVariant,
        element: Arc<DomElement>,
        parent: Option<NodeId>,
        root: RootId,
    ) -> Self {
        Self {
            key,
            variant,
            element,
            parent,
            root,
            children: Vec::new(),
            effective_namespace: None,
            effective_status: Status::Current,
            effective_conformance: None,
            effective_config: true,
            findings: IndexSet::new(),
            custom_data: HashMap::new(),
            document_order: None,
        }
    }

    pub fn key(&self) -> &StatementKey {
        &self.key
    }

    pub fn variant(&self) -> &StatementVariant {
        &self.variant
    }

    pub fn core_kind(&self) -> Option<CoreKind> {
        match &self.variant {
            StatementVariant::Core(kind) => Some(*kind),
            StatementVariant::Extension(_) => None,
        }
    }

    pub fn extension(&self) -> Option<&ExtensionVariant> {
        match &self.variant {
            StatementVariant::Extension(variant) => Some(variant),
            StatementVariant::Core(_) => None,
        }
    }

    pub fn is(&self, kind: CoreKind) -> bool {
        self.core_kind() == Some(kind)
    }

    pub fn is_extension(&self) -> bool {
        matches!(self.variant, StatementVariant::Extension(_))
    }

    /// Name as written in the document (with prefix for extensions)
    pub fn statement_name(&self) -> &str {
        self.element.name()
    }

    pub fn argument(&self) -> Option<&str> {
        self.element.value()
    }

    /// Argument with surrounding whitespace removed, or `""`
    pub fn trimmed_argument(&self) -> &str {
        self.element.value().map(str::trim).unwrap_or("")
    }

    pub fn element(&self) -> &Arc<DomElement> {
        &self.element
    }

    pub fn element_ref(&self) -> ElementRef {
        self.element.element_ref()
    }

    /// Prefix context of the document element this statement views
    pub fn prefix_resolver(&self) -> &Arc<dyn PrefixResolver> {
        self.element.prefix_resolver()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn root(&self) -> RootId {
        self.root
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn effective_namespace(&self) -> Option<&str> {
        self.effective_namespace.as_deref()
    }

    pub fn effective_status(&self) -> Status {
        self.effective_status
    }

    pub fn effective_conformance(&self) -> Option<ConformanceType> {
        self.effective_conformance
    }

    pub fn effective_config(&self) -> bool {
        self.effective_config
    }

    /// Findings attached to this statement
    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter()
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn custom_data(&self, key: &str) -> Option<&CustomValue> {
        self.custom_data.get(key)
    }

    pub fn custom_data_keys(&self) -> impl Iterator<Item = &str> {
        self.custom_data.keys().map(String::as_str)
    }

    pub fn set_custom_data(&mut self, key: impl Into<String>, value: CustomValue) {
        self.custom_data.insert(key.into(), value);
    }

    pub fn remove_custom_data(&mut self, key: &str) -> Option<CustomValue> {
        self.custom_data.remove(key)
    }

    /// Append a value to a list-valued custom data entry, creating it if needed
    pub fn push_custom_data(&mut self, key: &str, value: CustomValue) {
        match self.custom_data.get_mut(key) {
            Some(CustomValue::List(items)) => items.push(value),
            _ => {
                self.custom_data
                    .insert(key.to_string(), CustomValue::List(vec![value]));
            }
        }
    }

    /// Relative document position among same-kind siblings, recorded only
    /// for order-sensitive statements
    pub fn document_order(&self) -> Option<usize> {
        self.document_order
    }

    pub(crate) fn add_finding(&mut self, finding: Finding) {
        self.findings.insert(finding);
    }
}
