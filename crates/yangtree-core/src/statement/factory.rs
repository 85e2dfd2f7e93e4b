//! Turns document elements into statement nodes
//!
//! Unprefixed names are looked up in the core keyword table. Prefixed names
//! are extension usages: the prefix is resolved through the element's own
//! prefix resolver and the `(module, name)` pair is offered to the supplier
//! registry. The first supplier that recognises it provides the class;
//! unknown extensions get the catch-all class.

use super::key::StatementKey;
use super::kind::CoreKind;
use super::node::{ExtensionVariant, NodeId, RootId, StatementNode, StatementVariant};
use super::tree::StatementArena;
use crate::diagnostics::{Finding, FindingKind, FindingTarget};
use crate::dom::DomElement;
use crate::extensions::{GenericExtension, SupplierRegistry};
use crate::result::Result;
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of turning one element into a statement
#[derive(Debug)]
pub enum Instantiation {
    Created(NodeId),
    /// No statement was created; the finding explains why
    Rejected(Finding),
}

/// Creates statement nodes for document elements
#[derive(Default)]
pub struct StatementFactory {
    suppliers: SupplierRegistry,
}

impl StatementFactory {
    pub fn new(suppliers: SupplierRegistry) -> Self {
        Self { suppliers }
    }

    /// Factory consulting the built-in IETF, O-RAN and 3GPP suppliers
    pub fn with_builtin_suppliers() -> Self {
        Self::new(SupplierRegistry::with_builtin())
    }

    pub fn suppliers(&self) -> &SupplierRegistry {
        &self.suppliers
    }

    pub fn suppliers_mut(&mut self) -> &mut SupplierRegistry {
        &mut self.suppliers
    }

    /// Work out key and variant for an element without creating anything
    pub fn resolve(
        &self,
        element: &DomElement,
    ) -> std::result::Result<(StatementKey, StatementVariant), Finding> {
        match element.split_name() {
            (None, name) => match CoreKind::from_keyword(name) {
                Some(kind) => Ok((StatementKey::core(name), StatementVariant::Core(kind))),
                None => Err(Finding::new(
                    FindingTarget::Element(element.element_ref()),
                    FindingKind::InvalidSyntax,
                    format!("Not a valid YANG statement: {}", element.name()),
                )),
            },
            (Some(prefix), name) => {
                let Some(module) = element.prefix_resolver().module_for_prefix(prefix) else {
                    return Err(Finding::new(
                        FindingTarget::Element(element.element_ref()),
                        FindingKind::UnresolvablePrefix,
                        format!("Prefix '{prefix}' for the extension statement not resolvable."),
                    ));
                };
                let variant = match self.suppliers.resolve(&module, name) {
                    Some((supplier, class)) => {
                        debug!("Extension {}:{} handled by supplier {:?}", module, name, supplier);
                        ExtensionVariant {
                            supplier: Some(supplier),
                            class,
                        }
                    }
                    None => {
                        debug!("No supplier for extension {}:{}, using generic class", module, name);
                        ExtensionVariant {
                            supplier: None,
                            class: Arc::new(GenericExtension),
                        }
                    }
                };
                Ok((
                    StatementKey::new(module, name),
                    StatementVariant::Extension(variant),
                ))
            }
        }
    }

    /// Create a statement for `element` and append it under `parent`
    ///
    /// Without a parent the node becomes a free-standing node of `root`.
    pub fn instantiate(
        &self,
        arena: &mut StatementArena,
        element: &Arc<DomElement>,
        parent: Option<NodeId>,
        root: RootId,
    ) -> Result<Instantiation> {
        let (key, variant) = match self.resolve(element) {
            Ok(resolved) => resolved,
            Err(finding) => return Ok(Instantiation::Rejected(finding)),
        };
        let id = arena.alloc(StatementNode::new(key, variant, element.clone(), None, root));
        if let Some(parent) = parent {
            arena.append_child(parent, id)?;
        }
        trace!("Created {} for '{}'", id, element.name());
        Ok(Instantiation::Created(id))
    }
}
