//! Propagation of inherited attributes over a subtree
//!
//! These run after structural changes: namespace and conformance are plain
//! overwrites, status and config follow override rules.

use super::kind::CoreKind;
use super::node::{ConformanceType, NodeId, Status};
use super::tree::StatementArena;
use crate::result::Result;

impl StatementArena {
    /// Set the effective namespace of `subtree` and everything below it
    pub fn assign_effective_namespace(&mut self, subtree: NodeId, namespace: Option<&str>) -> Result<()> {
        for id in self.descendants(subtree)? {
            self.node_mut(id)?.effective_namespace = namespace.map(str::to_string);
        }
        Ok(())
    }

    /// Set the effective conformance of `subtree` and everything below it
    pub fn assign_effective_conformance(&mut self, subtree: NodeId, conformance: ConformanceType) -> Result<()> {
        for id in self.descendants(subtree)? {
            self.node_mut(id)?.effective_conformance = Some(conformance);
        }
        Ok(())
    }

    /// Compute effective config values below `subtree`
    ///
    /// A node takes its explicit `config` child's value only while the
    /// inherited value is `true`; once `false`, the whole subtree stays
    /// `false`. `action`, `rpc` and `notification` are always `false`.
    pub fn assign_effective_config(&mut self, subtree: NodeId, inherited: bool) -> Result<()> {
        let mut stack = vec![(subtree, inherited)];
        while let Some((id, inherited)) = stack.pop() {
            let node = self.node(id)?;
            let value = if node.core_kind().is_some_and(|k| k.forces_config_false()) {
                false
            } else if inherited {
                match self.first_child_of_kind(id, CoreKind::Config)? {
                    Some(config) => self.node(config)?.trimmed_argument() != "false",
                    None => true,
                }
            } else {
                false
            };
            let children = self.node(id)?.children().to_vec();
            self.node_mut(id)?.effective_config = value;
            stack.extend(children.into_iter().map(|c| (c, value)));
        }
        Ok(())
    }

    /// Compute effective status values below `subtree`
    ///
    /// An explicit `obsolete` always wins, `deprecated` only overrides an
    /// inherited `current`, and `current` never overrides anything.
    pub fn assign_effective_status(&mut self, subtree: NodeId, inherited: Status) -> Result<()> {
        let mut stack = vec![(subtree, inherited)];
        while let Some((id, inherited)) = stack.pop() {
            let explicit = self
                .first_child_of_kind(id, CoreKind::Status)?
                .and_then(|s| self.get(s))
                .and_then(|s| Status::from_keyword(s.trimmed_argument()));
            let value = match (inherited, explicit) {
                (_, Some(Status::Obsolete)) => Status::Obsolete,
                (Status::Current, Some(Status::Deprecated)) => Status::Deprecated,
                (inherited, _) => inherited,
            };
            let children = self.node(id)?.children().to_vec();
            self.node_mut(id)?.effective_status = value;
            stack.extend(children.into_iter().map(|c| (c, value)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::diagnostics::DefaultFindingCollector;
    use crate::dom::DocumentSpec;
    use crate::statement::{
        BuildContext, ConformanceType, CoreKind, Instantiation, NodeId, Rfc7950Grammar,
        StatementArena, StatementFactory, Status,
    };

    fn build(yaml: &str) -> (StatementArena, NodeId) {
        let element = DocumentSpec::from_yaml_str("test", yaml).unwrap().into_element();
        let factory = StatementFactory::default();
        let mut arena = StatementArena::new();
        let mut collector = DefaultFindingCollector::new();
        let root = arena.add_root(None, ConformanceType::Implement);
        let Instantiation::Created(top) = factory.instantiate(&mut arena, &element, None, root).unwrap()
        else {
            panic!("no top statement");
        };
        BuildContext::new(&mut arena, &Rfc7950Grammar, &factory, &mut collector)
            .process(top)
            .unwrap();
        (arena, top)
    }

    fn find(arena: &StatementArena, top: NodeId, name: &str) -> NodeId {
        arena
            .descendants(top)
            .unwrap()
            .into_iter()
            .find(|id| arena.node(*id).unwrap().argument() == Some(name))
            .unwrap()
    }

    const MODULE: &str = r#"
root:
  name: module
  value: m
  children:
    - { name: namespace, value: "urn:m" }
    - { name: prefix, value: m }
    - name: container
      value: state
      children:
        - { name: config, value: "false" }
        - name: leaf
          value: counter
          children:
            - { name: type, value: uint32 }
            - { name: config, value: "true" }
    - name: container
      value: settings
      children:
        - { name: status, value: deprecated }
        - name: leaf
          value: old
          children:
            - { name: type, value: string }
            - { name: status, value: current }
        - name: leaf
          value: gone
          children:
            - { name: type, value: string }
            - { name: status, value: obsolete }
    - name: rpc
      value: reset
      children:
        - name: input
          children:
            - name: leaf
              value: force
              children:
                - { name: type, value: boolean }
"#;

    #[test]
    fn test_config_is_monotonic() {
        let (mut arena, top) = build(MODULE);
        arena.assign_effective_config(top, true).unwrap();

        assert!(!arena.node(find(&arena, top, "state")).unwrap().effective_config());
        assert!(!arena.node(find(&arena, top, "counter")).unwrap().effective_config());
        assert!(arena.node(find(&arena, top, "settings")).unwrap().effective_config());
        assert!(!arena.node(find(&arena, top, "reset")).unwrap().effective_config());
        assert!(!arena.node(find(&arena, top, "force")).unwrap().effective_config());
    }

    #[test]
    fn test_status_override_rules() {
        let (mut arena, top) = build(MODULE);
        arena.assign_effective_status(top, Status::Current).unwrap();

        assert_eq!(arena.node(find(&arena, top, "settings")).unwrap().effective_status(), Status::Deprecated);
        assert_eq!(arena.node(find(&arena, top, "old")).unwrap().effective_status(), Status::Deprecated);
        assert_eq!(arena.node(find(&arena, top, "gone")).unwrap().effective_status(), Status::Obsolete);
        assert_eq!(arena.node(top).unwrap().effective_status(), Status::Current);
    }

    #[test]
    fn test_namespace_and_conformance_overwrite() {
        let (mut arena, top) = build(MODULE);
        arena.assign_effective_namespace(top, Some("urn:m")).unwrap();
        arena.assign_effective_conformance(top, ConformanceType::Import).unwrap();

        let leaf = find(&arena, top, "counter");
        assert_eq!(arena.node(leaf).unwrap().effective_namespace(), Some("urn:m"));
        assert_eq!(arena.node(leaf).unwrap().effective_conformance(), Some(ConformanceType::Import));
        assert!(arena.node(top).unwrap().is(CoreKind::Module));
    }
}
