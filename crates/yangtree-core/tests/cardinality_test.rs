//! Child cardinality enforcement through the public build pipeline

use std::sync::Arc;
use yangtree_core::{
    CoreKind, DocumentSpec, Engine, EngineConfiguration, FindingCollector, FindingKind,
    GrammarTable, MapGrammar, Rfc7950Grammar, Schema, SchemaDocument,
};

/// The built-in grammar, with `key` made a mandatory singleton of `list`
fn keyed_list_grammar() -> MapGrammar {
    let mut list = Rfc7950Grammar.cardinalities("list").unwrap().clone();
    list.optional_singleton.retain(|n| n != "key");
    list.mandatory_singleton.push("key".to_string());
    MapGrammar::rfc7950().with_statement("list", list)
}

fn build(yaml: &str) -> Schema {
    let spec = DocumentSpec::from_yaml_str("ran.yaml", yaml).unwrap();
    Engine::new(EngineConfiguration::default())
        .with_grammar(Arc::new(keyed_list_grammar()))
        .build(vec![SchemaDocument::from_spec(spec)])
        .unwrap()
}

fn sector_list(schema: &Schema) -> yangtree_core::NodeId {
    let top = schema.top_statement("ran").unwrap();
    schema.arena().children_of_kind(top, CoreKind::List).unwrap()[0]
}

#[test]
fn test_sector_duplicate_key_keeps_first() {
    let schema = build(
        r#"
root:
  name: module
  value: ran
  children:
    - { name: namespace, value: "urn:ran" }
    - { name: prefix, value: ran }
    - name: list
      value: Sector
      children:
        - { name: key, value: id }
        - { name: key, value: sectorId }
        - name: leaf
          value: id
          children: [ { name: type, value: string } ]
        - name: leaf
          value: sectorId
          children: [ { name: type, value: string } ]
"#,
    );

    let violations = schema
        .findings()
        .findings_of_kind(FindingKind::CardinalityViolation);
    assert_eq!(violations.len(), 1);

    let sector = sector_list(&schema);
    assert_eq!(violations[0].target.node(), Some(sector));
    assert_eq!(
        violations[0].message,
        "Child statement 'key' cannot exist more than once under 'list'."
    );

    let keys = schema.arena().children_of_kind(sector, CoreKind::Key).unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(schema.arena().node(keys[0]).unwrap().argument(), Some("id"));
    assert!(schema.arena().node(sector).unwrap().has_findings());
}

#[test]
fn test_missing_mandatory_singleton() {
    let schema = build(
        r#"
root:
  name: module
  value: ran
  children:
    - { name: namespace, value: "urn:ran" }
    - { name: prefix, value: ran }
    - name: list
      value: Sector
      children:
        - name: leaf
          value: id
          children: [ { name: type, value: string } ]
"#,
    );

    let missing = schema
        .findings()
        .findings_of_kind(FindingKind::MissingRequiredChild);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].message, "Statement 'key' required under 'list'.");

    let sector = sector_list(&schema);
    assert_eq!(missing[0].target.node(), Some(sector));
    assert!(
        schema
            .arena()
            .children_of_kind(sector, CoreKind::Key)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_illegal_and_unknown_children() {
    let schema = build(
        r#"
root:
  name: module
  value: ran
  children:
    - { name: namespace, value: "urn:ran" }
    - { name: prefix, value: ran }
    - name: container
      value: site
      children:
        - { name: key, value: id }
        - { name: leef, value: typo }
"#,
    );

    let illegal = schema
        .findings()
        .findings_of_kind(FindingKind::IllegalChildStatement);
    assert_eq!(illegal.len(), 1);
    assert_eq!(illegal[0].message, "Statement 'key' is not allowed under 'container'.");

    let unknown = schema.findings().findings_of_kind(FindingKind::InvalidSyntax);
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].message, "'leef' is not part of the core YANG language.");

    let top = schema.top_statement("ran").unwrap();
    let site = schema.arena().children_of_kind(top, CoreKind::Container).unwrap()[0];
    assert!(schema.arena().children_of(site).unwrap().is_empty());
}

#[test]
fn test_sibling_data_nodes_keep_document_order() {
    let schema = build(
        r#"
root:
  name: module
  value: ran
  children:
    - { name: namespace, value: "urn:ran" }
    - { name: prefix, value: ran }
    - name: leaf
      value: a
      children: [ { name: type, value: string } ]
    - { name: container, value: b }
    - name: leaf
      value: c
      children: [ { name: type, value: string } ]
    - { name: container, value: d }
"#,
    );

    let top = schema.top_statement("ran").unwrap();
    let arena = schema.arena();
    let names: Vec<&str> = arena
        .children_of(top)
        .unwrap()
        .iter()
        .map(|c| arena.node(*c).unwrap())
        .filter(|n| n.is(CoreKind::Leaf) || n.is(CoreKind::Container))
        .map(|n| n.trimmed_argument())
        .collect();
    assert_eq!(names, vec!["a", "b", "c", "d"]);
    assert_eq!(schema.findings().total_count(), 0);
}
