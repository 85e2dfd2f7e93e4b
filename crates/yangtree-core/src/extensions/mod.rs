//! Extension statement classes and the suppliers that provide them
//!
//! An extension usage (`prefix:name`) is dispatched to an [`ExtensionClass`]
//! by asking each registered [`StatementClassSupplier`] in turn. The first
//! supplier that knows `(module, name)` wins. Unknown extensions fall back to
//! [`GenericExtension`], which accepts any argument and any parent, so an
//! unfamiliar extension never blocks the rest of the tree.
//!
//! Most built-in extensions are described declaratively by an
//! [`ExtensionRule`]; the few with extra semantics attach a post-check.

pub mod ietf;
pub mod oran;
pub mod threegpp;

use crate::diagnostics::FindingKind;
use crate::result::Result;
use crate::statement::{BuildContext, CoreKind, ModuleId, NodeId, StatementKey, SupplierId};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// How many instances of an extension may appear under one parent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxCardinality {
    One,
    Multiple,
}

/// Behaviour of one extension statement
///
/// Default methods describe the catch-all behaviour: optional argument, any
/// parent, no validation.
pub trait ExtensionClass: Send + Sync {
    /// Short identifier of the class, e.g. `ietf-yang-metadata:annotation`
    fn tag(&self) -> &str;

    fn argument_is_mandatory(&self) -> bool {
        false
    }

    fn max_cardinality_under_parent(&self) -> MaxCardinality {
        MaxCardinality::Multiple
    }

    fn can_be_child_of(&self, _parent: &StatementKey) -> bool {
        true
    }

    fn order_under_parent_matters(&self) -> bool {
        false
    }

    /// Runs after the extension's own children were extracted
    fn validate(&self, _cx: &mut BuildContext<'_>, _node: NodeId) -> Result<()> {
        Ok(())
    }

    /// Runs once the whole subtree below the extension exists
    fn subtree_processed(&self, _cx: &mut BuildContext<'_>, _node: NodeId) -> Result<()> {
        Ok(())
    }
}

/// Catch-all class for extensions no supplier recognises
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericExtension;

impl ExtensionClass for GenericExtension {
    fn tag(&self) -> &str {
        "extension"
    }
}

/// Argument policy of a declaratively described extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionArgument {
    /// Must be present and non-empty
    Mandatory,
    /// Must be a YANG identifier
    Identifier,
    /// Must be absent
    Forbidden,
    /// Anything goes
    Optional,
}

/// Extra check run after an extension's subtree was built
pub type PostCheck = fn(&mut BuildContext<'_>, NodeId) -> Result<()>;

/// Declarative description of an extension statement
#[derive(Clone)]
pub struct ExtensionRule {
    key: StatementKey,
    tag: String,
    argument: ExtensionArgument,
    max_cardinality: MaxCardinality,
    allowed_parents: Option<Vec<StatementKey>>,
    also_under_deviate_or_refine: bool,
    order_matters: bool,
    value_pattern: Option<(Regex, String)>,
    post_check: Option<PostCheck>,
}

impl ExtensionRule {
    pub fn new(module: &str, name: &str) -> Self {
        let key = StatementKey::new(ModuleId::new(module), name);
        Self {
            tag: key.to_string(),
            key,
            argument: ExtensionArgument::Optional,
            max_cardinality: MaxCardinality::One,
            allowed_parents: None,
            also_under_deviate_or_refine: false,
            order_matters: false,
            value_pattern: None,
            post_check: None,
        }
    }

    pub fn argument(mut self, argument: ExtensionArgument) -> Self {
        self.argument = argument;
        self
    }

    pub fn max_cardinality(mut self, max: MaxCardinality) -> Self {
        self.max_cardinality = max;
        self
    }

    /// Restrict the parents to the given core statements
    pub fn parents(mut self, parents: &[CoreKind]) -> Self {
        self.allowed_parents = Some(
            parents
                .iter()
                .map(|k| StatementKey::core(k.keyword()))
                .collect(),
        );
        self
    }

    /// Additionally accept `deviate` and `refine` as parent
    pub fn also_under_deviate_or_refine(mut self) -> Self {
        self.also_under_deviate_or_refine = true;
        self
    }

    pub fn order_matters(mut self) -> Self {
        self.order_matters = true;
        self
    }

    /// Require the argument to match `pattern`, reporting `message` otherwise
    pub fn value_pattern(mut self, pattern: Regex, message: impl Into<String>) -> Self {
        self.value_pattern = Some((pattern, message.into()));
        self
    }

    pub fn post_check(mut self, check: PostCheck) -> Self {
        self.post_check = Some(check);
        self
    }

    pub fn key(&self) -> &StatementKey {
        &self.key
    }

    fn check_parent(&self, cx: &mut BuildContext<'_>, node: NodeId) -> Result<()> {
        let Some(parent) = cx.arena().node(node)?.parent() else {
            return Ok(());
        };
        let parent_node = cx.arena().node(parent)?;
        if self.also_under_deviate_or_refine
            && (parent_node.is(CoreKind::Deviate) || parent_node.is(CoreKind::Refine))
        {
            return Ok(());
        }
        let parent_key = parent_node.key().clone();
        let parent_name = parent_node.statement_name().to_string();
        if !self.can_be_child_of(&parent_key) {
            cx.report_on(
                node,
                FindingKind::InvalidExtension,
                format!(
                    "Extension statement '{}' is not allowed under '{}'.",
                    self.key.name(),
                    parent_name
                ),
            )?;
        }
        Ok(())
    }

    fn check_cardinality_under_parent(&self, cx: &mut BuildContext<'_>, node: NodeId) -> Result<()> {
        if self.max_cardinality == MaxCardinality::Multiple {
            return Ok(());
        }
        let Some(parent) = cx.arena().node(node)?.parent() else {
            return Ok(());
        };
        let siblings = cx.arena().children_with_key(parent, &self.key)?.len();
        if siblings > 1 {
            cx.report_on(
                node,
                FindingKind::InvalidExtension,
                "The allowed maximum cardinality for this extension statement is 1.",
            )?;
        }
        Ok(())
    }
}

impl ExtensionClass for ExtensionRule {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn argument_is_mandatory(&self) -> bool {
        matches!(
            self.argument,
            ExtensionArgument::Mandatory | ExtensionArgument::Identifier
        )
    }

    fn max_cardinality_under_parent(&self) -> MaxCardinality {
        self.max_cardinality
    }

    fn can_be_child_of(&self, parent: &StatementKey) -> bool {
        match &self.allowed_parents {
            Some(parents) => parents.contains(parent),
            None => true,
        }
    }

    fn order_under_parent_matters(&self) -> bool {
        self.order_matters
    }

    fn validate(&self, cx: &mut BuildContext<'_>, node: NodeId) -> Result<()> {
        match self.argument {
            ExtensionArgument::Mandatory => {
                cx.check_argument_not_empty(node)?;
            }
            ExtensionArgument::Identifier => {
                if cx.check_argument_not_empty(node)? {
                    cx.check_identifier(node)?;
                }
            }
            ExtensionArgument::Forbidden => {
                if cx.arena().node(node)?.argument().is_some() {
                    cx.report_on(
                        node,
                        FindingKind::InvalidSyntax,
                        format!(
                            "'{}' extension does not allow for an argument.",
                            self.key.name()
                        ),
                    )?;
                }
            }
            ExtensionArgument::Optional => {}
        }

        if let Some((pattern, message)) = &self.value_pattern {
            let argument = cx.arena().node(node)?.trimmed_argument().to_string();
            if !argument.is_empty() && !pattern.is_match(&argument) {
                cx.report_on(node, FindingKind::InvalidExtension, message.clone())?;
            }
        }

        self.check_parent(cx, node)?;
        self.check_cardinality_under_parent(cx, node)
    }

    fn subtree_processed(&self, cx: &mut BuildContext<'_>, node: NodeId) -> Result<()> {
        match self.post_check {
            Some(check) => check(cx, node),
            None => Ok(()),
        }
    }
}

/// Provides extension classes for the modules it knows
pub trait StatementClassSupplier: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Statement names handled, per defining module
    fn handled_statements(&self) -> HashMap<ModuleId, Vec<String>>;

    /// Class for `module:name`, if this supplier handles it
    fn class_for(&self, module: &ModuleId, name: &str) -> Option<Arc<dyn ExtensionClass>>;
}

/// Supplier backed by a fixed table of classes
#[derive(Clone)]
pub struct TableSupplier {
    name: String,
    classes: HashMap<StatementKey, Arc<dyn ExtensionClass>>,
}

impl TableSupplier {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: HashMap::new(),
        }
    }

    /// Add a declaratively described extension
    pub fn with_rule(mut self, rule: ExtensionRule) -> Self {
        self.classes.insert(rule.key().clone(), Arc::new(rule));
        self
    }

    /// Add any class under an explicit key
    pub fn with_class(mut self, key: StatementKey, class: Arc<dyn ExtensionClass>) -> Self {
        self.classes.insert(key, class);
        self
    }
}

impl StatementClassSupplier for TableSupplier {
    fn name(&self) -> &str {
        &self.name
    }

    fn handled_statements(&self) -> HashMap<ModuleId, Vec<String>> {
        let mut handled: HashMap<ModuleId, Vec<String>> = HashMap::new();
        for key in self.classes.keys() {
            handled
                .entry(key.owning_module().clone())
                .or_default()
                .push(key.name().to_string());
        }
        for names in handled.values_mut() {
            names.sort();
        }
        handled
    }

    fn class_for(&self, module: &ModuleId, name: &str) -> Option<Arc<dyn ExtensionClass>> {
        self.classes
            .get(&StatementKey::new(module.clone(), name))
            .cloned()
    }
}

/// Ordered list of suppliers consulted for extension dispatch
#[derive(Default)]
pub struct SupplierRegistry {
    suppliers: Vec<Box<dyn StatementClassSupplier>>,
}

impl SupplierRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            suppliers: Vec::new(),
        }
    }

    /// Registry holding the IETF, O-RAN and 3GPP suppliers
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.add(Box::new(ietf::supplier()));
        registry.add(Box::new(oran::supplier()));
        registry.add(Box::new(threegpp::supplier()));
        registry
    }

    /// Add a supplier; earlier suppliers take precedence
    pub fn add(&mut self, supplier: Box<dyn StatementClassSupplier>) -> SupplierId {
        debug!("Registering statement class supplier: {}", supplier.name());
        self.suppliers.push(supplier);
        SupplierId(self.suppliers.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.suppliers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suppliers.is_empty()
    }

    pub fn supplier(&self, id: SupplierId) -> Option<&dyn StatementClassSupplier> {
        self.suppliers.get(id.0).map(|s| s.as_ref())
    }

    /// First supplier class for `module:name`
    pub fn resolve(
        &self,
        module: &ModuleId,
        name: &str,
    ) -> Option<(SupplierId, Arc<dyn ExtensionClass>)> {
        self.suppliers
            .iter()
            .enumerate()
            .find_map(|(index, supplier)| {
                supplier
                    .class_for(module, name)
                    .map(|class| (SupplierId(index), class))
            })
    }

    /// Everything the registered suppliers handle, merged
    pub fn handled_statements(&self) -> HashMap<ModuleId, Vec<String>> {
        let mut merged: HashMap<ModuleId, Vec<String>> = HashMap::new();
        for supplier in &self.suppliers {
            for (module, names) in supplier.handled_statements() {
                let entry = merged.entry(module).or_default();
                for name in names {
                    if !entry.contains(&name) {
                        entry.push(name);
                    }
                }
            }
        }
        merged
    }
}
