//! Identities and their base/derived graph
//!
//! Population happens through [`IdentityRegistryBuilder`], which can be fed
//! from several threads at once (one tree root per task). [`build`] then
//! freezes the collected identities into a petgraph graph used for the
//! read-only queries.
//!
//! [`build`]: IdentityRegistryBuilder::build

use crate::diagnostics::{ElementRef, Finding, FindingKind, FindingTarget};
use crate::result::Result;
use crate::statement::{CoreKind, ModuleId, NodeId, RootId, StatementArena};
use dashmap::DashMap;
use petgraph::Direction;
use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors of the identity graph
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Circular identity derivation: {}", format_cycle(.cycle))]
    CircularDerivation { cycle: Vec<String> },
}

fn format_cycle(cycle: &[String]) -> String {
    cycle.join(" → ")
}

/// A named abstract type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Identity {
    pub namespace: String,
    pub module: ModuleId,
    pub local_name: String,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.local_name)
    }
}

type IdentityKey = (ModuleId, String);

#[derive(Debug, Clone)]
struct IdentityEntry {
    identity: Identity,
    node: NodeId,
    element: ElementRef,
    bases: Vec<(IdentityKey, ElementRef, NodeId)>,
}

/// Concurrent collection phase of the identity registry
#[derive(Debug, Default)]
pub struct IdentityRegistryBuilder {
    entries: DashMap<IdentityKey, IdentityEntry>,
}

impl IdentityRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every `identity` statement of `root` together with its bases
    ///
    /// Returns findings for `base` prefixes that cannot be resolved.
    pub fn collect(&self, arena: &StatementArena, root: RootId) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        let Some(top) = arena.root(root)?.top_statement() else {
            return Ok(findings);
        };
        let namespace = arena.namespace_of_root(root)?.unwrap_or_default();

        for id in arena.children_of_kind(top, CoreKind::Identity)? {
            let statement = arena.node(id)?;
            let module = statement.prefix_resolver().default_module();
            let identity = Identity {
                namespace: namespace.clone(),
                module: module.clone(),
                local_name: statement.trimmed_argument().to_string(),
            };

            let mut bases = Vec::new();
            for base_id in arena.children_of_kind(id, CoreKind::Base)? {
                let base = arena.node(base_id)?;
                let reference = base.trimmed_argument();
                let (base_module, base_name) = match reference.split_once(':') {
                    Some((prefix, name)) => match base.prefix_resolver().module_for_prefix(prefix) {
                        Some(module) => (module, name),
                        None => {
                            findings.push(Finding::new(
                                FindingTarget::Statement {
                                    node: base_id,
                                    element: base.element_ref(),
                                },
                                FindingKind::UnresolvablePrefix,
                                format!("Prefix '{prefix}' of base '{reference}' not resolvable."),
                            ));
                            continue;
                        }
                    },
                    None => (module.clone(), reference),
                };
                bases.push(((base_module, base_name.to_string()), base.element_ref(), base_id));
            }

            trace!("Collected identity {} with {} base(s)", identity, bases.len());
            self.entries.insert(
                (module, identity.local_name.clone()),
                IdentityEntry {
                    identity,
                    node: id,
                    element: statement.element_ref(),
                    bases,
                },
            );
        }
        Ok(findings)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze into the queryable registry
    ///
    /// Returns findings for bases that name no known identity and one
    /// identity-cycle finding per derivation cycle.
    pub fn build(self) -> (IdentityRegistry, Vec<Finding>) {
        let mut entries: Vec<IdentityEntry> = self.entries.into_iter().map(|(_, e)| e).collect();
        entries.sort_by(|a, b| a.identity.cmp(&b.identity));

        let mut registry = IdentityRegistry::default();
        for entry in &entries {
            let index = registry.graph.add_node(entry.identity.clone());
            registry
                .by_key
                .insert((entry.identity.module.clone(), entry.identity.local_name.clone()), index);
            registry.nodes.insert(index, entry.node);
        }

        let mut findings = Vec::new();
        for entry in &entries {
            let derived = registry.by_key[&(entry.identity.module.clone(), entry.identity.local_name.clone())];
            for (key, element, base_node) in &entry.bases {
                match registry.by_key.get(key) {
                    Some(&base) => {
                        registry.graph.update_edge(base, derived, ());
                    }
                    None => findings.push(Finding::new(
                        FindingTarget::Statement {
                            node: *base_node,
                            element: element.clone(),
                        },
                        FindingKind::Unspecified,
                        format!("Base identity '{}:{}' not found.", key.0, key.1),
                    )),
                }
            }
        }

        let elements: HashMap<NodeIndex, &IdentityEntry> = entries
            .iter()
            .filter_map(|e| registry.index_of(&e.identity).map(|i| (i, e)))
            .collect();
        for cycle in registry.find_cycles() {
            let Some(entry) = cycle
                .first()
                .and_then(|i| registry.index_of(i))
                .and_then(|i| elements.get(&i))
            else {
                continue;
            };
            let names: Vec<String> = cycle.iter().map(|i| i.to_string()).collect();
            findings.push(Finding::new(
                FindingTarget::Statement {
                    node: entry.node,
                    element: entry.element.clone(),
                },
                FindingKind::IdentityCycle,
                format!("Identity derivation cycle: {}", format_cycle(&names)),
            ));
        }

        debug!(
            "Identity registry built: {} identities, {} derivations",
            registry.graph.node_count(),
            registry.graph.edge_count()
        );
        (registry, findings)
    }
}

/// Read-only identity graph; edges point from base to derived identity
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    graph: DiGraph<Identity, ()>,
    by_key: HashMap<IdentityKey, NodeIndex>,
    nodes: HashMap<NodeIndex, NodeId>,
}

impl IdentityRegistry {
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.graph.node_weights()
    }

    pub fn get(&self, module: &ModuleId, local_name: &str) -> Option<&Identity> {
        self.by_key
            .get(&(module.clone(), local_name.to_string()))
            .map(|&i| &self.graph[i])
    }

    /// Statement that defines `identity`
    pub fn statement_of(&self, identity: &Identity) -> Option<NodeId> {
        self.index_of(identity).and_then(|i| self.nodes.get(&i).copied())
    }

    fn index_of(&self, identity: &Identity) -> Option<NodeIndex> {
        self.by_key
            .get(&(identity.module.clone(), identity.local_name.clone()))
            .copied()
            .filter(|&i| &self.graph[i] == identity)
    }

    /// Direct bases, de-duplicated and ordered
    pub fn bases_of(&self, identity: &Identity) -> BTreeSet<&Identity> {
        self.neighbors(identity, Direction::Incoming)
    }

    /// Direct derivatives, de-duplicated and ordered
    pub fn derivatives_of(&self, identity: &Identity) -> BTreeSet<&Identity> {
        self.neighbors(identity, Direction::Outgoing)
    }

    fn neighbors(&self, identity: &Identity, direction: Direction) -> BTreeSet<&Identity> {
        let Some(index) = self.index_of(identity) else {
            return BTreeSet::new();
        };
        self.graph
            .neighbors_directed(index, direction)
            .map(|i| &self.graph[i])
            .collect()
    }

    /// `identity` and every identity derived from it, directly or not
    ///
    /// Empty for identities the registry does not know.
    pub fn closure(&self, identity: &Identity) -> BTreeSet<&Identity> {
        let mut closure = BTreeSet::new();
        let Some(start) = self.index_of(identity) else {
            return closure;
        };
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(index) = dfs.next(&self.graph) {
            closure.insert(&self.graph[index]);
        }
        closure
    }

    /// Whether `derived` is `base` or derives from it
    pub fn is_derived_from_or_self(&self, derived: &Identity, base: &Identity) -> bool {
        match (self.index_of(base), self.index_of(derived)) {
            (Some(from), Some(to)) => petgraph::algo::has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    /// Every derivation cycle, closed by repeating its first identity
    pub fn find_cycles(&self) -> Vec<Vec<&Identity>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || (scc.len() == 1 && self.graph.contains_edge(scc[0], scc[0])))
            .map(|scc| {
                let mut cycle: Vec<&Identity> = scc.iter().map(|&i| &self.graph[i]).collect();
                cycle.push(cycle[0]);
                cycle
            })
            .collect()
    }

    /// Fail when the derivation graph has a cycle
    pub fn check_acyclic(&self) -> std::result::Result<(), RegistryError> {
        if !is_cyclic_directed(&self.graph) {
            return Ok(());
        }
        let cycle = self
            .find_cycles()
            .into_iter()
            .next()
            .map(|c| c.iter().map(|i| i.to_string()).collect())
            .unwrap_or_default();
        Err(RegistryError::CircularDerivation { cycle })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DefaultFindingCollector;
    use crate::dom::DocumentSpec;
    use crate::statement::{BuildContext, ConformanceType, Instantiation, Rfc7950Grammar, StatementFactory};

    fn arena_with(yaml: &str) -> (StatementArena, RootId) {
        let element = DocumentSpec::from_yaml_str("test", yaml).unwrap().into_element();
        let factory = StatementFactory::default();
        let mut arena = StatementArena::new();
        let mut collector = DefaultFindingCollector::new();
        let root = arena.add_root(None, ConformanceType::Implement);
        let Instantiation::Created(top) = factory.instantiate(&mut arena, &element, None, root).unwrap()
        else {
            panic!("no top statement");
        };
        arena.set_top_statement(root, top).unwrap();
        BuildContext::new(&mut arena, &Rfc7950Grammar, &factory, &mut collector)
            .process(top)
            .unwrap();
        (arena, root)
    }

    fn identity(name: &str) -> Identity {
        Identity {
            namespace: "urn:ids".to_string(),
            module: ModuleId::new("ids"),
            local_name: name.to_string(),
        }
    }

    const CHAIN: &str = r#"
root:
  name: module
  value: ids
  children:
    - { name: namespace, value: "urn:ids" }
    - { name: prefix, value: i }
    - { name: identity, value: A }
    - name: identity
      value: B
      children: [{ name: base, value: "i:A" }]
    - name: identity
      value: C
      children: [{ name: base, value: B }]
    - { name: identity, value: D }
"#;

    #[test]
    fn test_closure_follows_derivations() {
        let (arena, root) = arena_with(CHAIN);
        let builder = IdentityRegistryBuilder::new();
        assert!(builder.collect(&arena, root).unwrap().is_empty());
        let (registry, findings) = builder.build();
        assert!(findings.is_empty());

        let closure: Vec<String> = registry
            .closure(&identity("A"))
            .into_iter()
            .map(|i| i.local_name.clone())
            .collect();
        assert_eq!(closure, vec!["A", "B", "C"]);
        assert!(registry.closure(&identity("unknown")).is_empty());

        let c_bases: Vec<_> = registry.bases_of(&identity("C")).into_iter().collect();
        assert_eq!(c_bases, vec![&identity("B")]);
        let a_derivatives: Vec<_> = registry.derivatives_of(&identity("A")).into_iter().collect();
        assert_eq!(a_derivatives, vec![&identity("B")]);
        assert!(registry.bases_of(&identity("unknown")).is_empty());
        assert!(registry.is_derived_from_or_self(&identity("C"), &identity("A")));
        assert!(!registry.is_derived_from_or_self(&identity("D"), &identity("A")));
        assert!(registry.check_acyclic().is_ok());
    }

    #[test]
    fn test_cycle_is_reported() {
        let (arena, root) = arena_with(
            r#"
root:
  name: module
  value: ids
  children:
    - { name: namespace, value: "urn:ids" }
    - { name: prefix, value: i }
    - name: identity
      value: X
      children: [{ name: base, value: Y }]
    - name: identity
      value: Y
      children: [{ name: base, value: X }]
    - name: identity
      value: Z
      children: [{ name: base, value: "q:nothing" }]
"#,
        );
        let builder = IdentityRegistryBuilder::new();
        let unresolved = builder.collect(&arena, root).unwrap();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].kind, FindingKind::UnresolvablePrefix);

        let (registry, findings) = builder.build();
        let cycles: Vec<_> = findings
            .iter()
            .filter(|f| f.kind == FindingKind::IdentityCycle)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].message.contains(" → "));
        assert!(matches!(
            registry.check_acyclic(),
            Err(RegistryError::CircularDerivation { .. })
        ));
    }
}
