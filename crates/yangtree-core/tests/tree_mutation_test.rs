//! Re-parenting, cloning and effective attributes on built trees

use yangtree_core::{
    CoreKind, CustomValue, DocumentSpec, Engine, ModuleId, NodeId, Schema, SchemaDocument,
    StatementKey, Status,
};

const ACME: &str = r#"
root:
  name: module
  value: acme
  children:
    - { name: namespace, value: "urn:acme" }
    - { name: prefix, value: acme }
    - name: import
      value: acme-types
      children: [ { name: prefix, value: at } ]
    - name: container
      value: system
      children:
        - name: leaf
          value: uptime
          children: [ { name: type, value: "at:counter" } ]
        - name: container
          value: state
          children:
            - { name: config, value: "false" }
            - name: leaf
              value: boot-count
              children: [ { name: type, value: uint32 } ]
        - name: leaf
          value: legacy
          children:
            - { name: type, value: string }
            - { name: status, value: deprecated }
    - name: rpc
      value: reboot
      children:
        - name: input
          children:
            - name: leaf
              value: delay
              children: [ { name: type, value: uint32 } ]
"#;

const WIDGETS: &str = r#"
root:
  name: module
  value: widgets
  children:
    - { name: namespace, value: "urn:widgets" }
    - { name: prefix, value: w }
    - name: import
      value: other-types
      children: [ { name: prefix, value: at } ]
    - { name: container, value: a }
    - { name: container, value: b }
"#;

fn build() -> Schema {
    let docs = [ACME, WIDGETS]
        .iter()
        .map(|yaml| {
            SchemaDocument::from_spec(DocumentSpec::from_yaml_str("test.yaml", yaml).unwrap())
        })
        .collect();
    Engine::default().build(docs).unwrap()
}

fn child(schema: &Schema, parent: NodeId, kind: CoreKind, name: &str) -> NodeId {
    schema
        .arena()
        .children_of_kind(parent, kind)
        .unwrap()
        .into_iter()
        .find(|c| schema.arena().node(*c).unwrap().argument() == Some(name))
        .unwrap()
}

#[test]
fn test_reparenting_is_idempotent() {
    let mut schema = build();
    let widgets = schema.top_statement("widgets").unwrap();
    let a = child(&schema, widgets, CoreKind::Container, "a");
    let b = child(&schema, widgets, CoreKind::Container, "b");
    let acme = schema.top_statement("acme").unwrap();
    let system = child(&schema, acme, CoreKind::Container, "system");
    let uptime = child(&schema, system, CoreKind::Leaf, "uptime");

    let arena = schema.arena_mut();
    arena.add_child(a, uptime, None).unwrap();
    arena.add_child(b, uptime, None).unwrap();

    assert_eq!(arena.children_of(b).unwrap().iter().filter(|c| **c == uptime).count(), 1);
    assert!(!arena.children_of(a).unwrap().contains(&uptime));
    assert!(!arena.children_of(system).unwrap().contains(&uptime));
    assert_eq!(arena.node(uptime).unwrap().parent(), Some(b));
    assert_eq!(arena.node(uptime).unwrap().root(), arena.node(widgets).unwrap().root());
}

#[test]
fn test_clone_keeps_prefix_context() {
    let mut schema = build();
    let acme = schema.top_statement("acme").unwrap();
    let system = child(&schema, acme, CoreKind::Container, "system");
    let uptime = child(&schema, system, CoreKind::Leaf, "uptime");
    let widgets = schema.top_statement("widgets").unwrap();
    let a = child(&schema, widgets, CoreKind::Container, "a");

    let copy = schema.arena_mut().clone_subtree(uptime, a).unwrap();
    let arena = schema.arena();
    let cloned = arena.node(copy).unwrap();

    assert_eq!(cloned.parent(), Some(a));
    assert_eq!(cloned.root(), arena.node(widgets).unwrap().root());
    assert_eq!(
        cloned.prefix_resolver().module_for_prefix("at"),
        Some(ModuleId::new("acme-types"))
    );
    assert_eq!(
        arena.node(widgets).unwrap().prefix_resolver().module_for_prefix("at"),
        Some(ModuleId::new("other-types"))
    );
    assert_eq!(arena.children_of(copy).unwrap().len(), 1);
    assert!(arena.children_of(system).unwrap().contains(&uptime));
    assert!(!cloned.has_findings());
}

#[test]
fn test_clone_copies_custom_data() {
    let mut schema = build();
    let acme = schema.top_statement("acme").unwrap();
    let system = child(&schema, acme, CoreKind::Container, "system");
    let widgets = schema.top_statement("widgets").unwrap();
    let b = child(&schema, widgets, CoreKind::Container, "b");

    let arena = schema.arena_mut();
    arena
        .node_mut(system)
        .unwrap()
        .push_custom_data("origin", CustomValue::Text("acme".to_string()));
    let copy = arena.clone_subtree(system, b).unwrap();
    arena
        .node_mut(copy)
        .unwrap()
        .push_custom_data("origin", CustomValue::Text("copy".to_string()));

    let original = arena.node(system).unwrap().custom_data("origin").unwrap();
    assert_eq!(original.as_list().unwrap().len(), 1);
    let copied = arena.node(copy).unwrap().custom_data("origin").unwrap();
    assert_eq!(copied.as_list().unwrap().len(), 2);
}

#[test]
fn test_replace_children_with() {
    let mut schema = build();
    let widgets = schema.top_statement("widgets").unwrap();
    let a = child(&schema, widgets, CoreKind::Container, "a");
    let b = child(&schema, widgets, CoreKind::Container, "b");

    let arena = schema.arena_mut();
    let removed = arena
        .replace_children_with(widgets, &StatementKey::core("container"), vec![b])
        .unwrap();
    assert_eq!(removed, vec![a, b]);
    assert_eq!(arena.children_of_kind(widgets, CoreKind::Container).unwrap(), vec![b]);
    assert_eq!(arena.node(a).unwrap().parent(), None);

    arena.discard(a).unwrap();
    assert!(!arena.contains(a));
    assert!(arena.node(a).is_err());
}

#[test]
fn test_config_monotonicity() {
    let schema = build();
    let arena = schema.arena();
    let acme = schema.top_statement("acme").unwrap();
    let system = child(&schema, acme, CoreKind::Container, "system");
    let state = child(&schema, system, CoreKind::Container, "state");
    let boot_count = child(&schema, state, CoreKind::Leaf, "boot-count");
    let reboot = child(&schema, acme, CoreKind::Rpc, "reboot");

    assert!(arena.node(system).unwrap().effective_config());
    assert!(!arena.node(state).unwrap().effective_config());
    assert!(!arena.node(boot_count).unwrap().effective_config());

    for id in arena.descendants(reboot).unwrap() {
        assert!(!arena.node(id).unwrap().effective_config());
    }
    for id in arena.descendants(state).unwrap() {
        assert!(!arena.node(id).unwrap().effective_config());
    }
}

#[test]
fn test_effective_status_and_namespace() {
    let schema = build();
    let arena = schema.arena();
    let acme = schema.top_statement("acme").unwrap();
    let system = child(&schema, acme, CoreKind::Container, "system");
    let legacy = child(&schema, system, CoreKind::Leaf, "legacy");
    let uptime = child(&schema, system, CoreKind::Leaf, "uptime");

    assert_eq!(arena.node(legacy).unwrap().effective_status(), Status::Deprecated);
    assert_eq!(arena.node(uptime).unwrap().effective_status(), Status::Current);
    assert_eq!(arena.node(uptime).unwrap().effective_namespace(), Some("urn:acme"));
}
