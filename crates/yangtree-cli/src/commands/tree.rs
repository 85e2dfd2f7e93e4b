//! `yangtree tree`: print built statement trees

use anyhow::{Result, bail};
use colored::*;
use std::path::PathBuf;
use yangtree_core::{Engine, NodeId, Schema, StatementArena, Status};

use crate::FeatureArgs;

pub fn tree_command(
    paths: Vec<PathBuf>,
    features: FeatureArgs,
    module: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = super::resolve_config(config_path.as_deref(), &features)?;
    let files = super::collect_documents(&paths)?;
    let documents = super::load_documents(&files)?;
    let schema = Engine::new(config).build(documents)?;

    let tops: Vec<NodeId> = match &module {
        Some(name) => match schema.top_statement(name) {
            Some(top) => vec![top],
            None => bail!("Module '{}' not found in input", name),
        },
        None => schema
            .arena()
            .roots()
            .filter_map(|root| root.top_statement())
            .collect(),
    };

    for top in tops {
        print!("{}", render_tree(&schema, top)?);
    }
    Ok(())
}

/// Indented rendering of a statement subtree
///
/// Schema nodes are annotated with `rw`/`ro`; non-current status is shown in
/// brackets and the module root carries its effective namespace.
pub fn render_tree(schema: &Schema, top: NodeId) -> Result<String> {
    let arena = schema.arena();
    let mut out = String::new();
    let node = arena.node(top)?;
    out.push_str(&format!(
        "{} {}",
        node.key().to_string().bold(),
        node.trimmed_argument()
    ));
    if let Some(namespace) = node.effective_namespace() {
        out.push_str(&format!(" ({})", namespace.dimmed()));
    }
    out.push('\n');
    for child in arena.children_of(top)? {
        render_node(arena, *child, 1, &mut out)?;
    }
    Ok(out)
}

fn render_node(arena: &StatementArena, id: NodeId, depth: usize, out: &mut String) -> Result<()> {
    let node = arena.node(id)?;
    out.push_str(&"  ".repeat(depth));

    let schema_node = node.core_kind().is_some_and(|k| k.defines_schema_node());
    if schema_node {
        let access = if node.effective_config() { "rw" } else { "ro" };
        out.push_str(&format!("{} ", access.cyan()));
    }

    let keyword = if node.is_extension() {
        node.key().to_string().magenta().to_string()
    } else {
        node.key().to_string()
    };
    out.push_str(&keyword);
    let argument = node.trimmed_argument();
    if !argument.is_empty() {
        out.push(' ');
        out.push_str(argument);
    }
    if schema_node && node.effective_status() != Status::Current {
        out.push_str(&format!(" [{}]", node.effective_status().keyword().yellow()));
    }
    if node.has_findings() {
        out.push_str(&format!(" {}", "!".red().bold()));
    }
    out.push('\n');

    for child in arena.children_of(id)? {
        render_node(arena, *child, depth + 1, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yangtree_core::{DocumentSpec, SchemaDocument};

    const MODULE: &str = r#"
root:
  name: module
  value: acme
  children:
    - { name: namespace, value: "urn:acme" }
    - { name: prefix, value: acme }
    - name: container
      value: system
      children:
        - { name: config, value: "false" }
        - name: leaf
          value: legacy
          children:
            - { name: type, value: string }
            - { name: status, value: deprecated }
"#;

    #[test]
    fn test_render_tree_shows_attributes() {
        colored::control::set_override(false);
        let spec = DocumentSpec::from_yaml_str("acme.yaml", MODULE).unwrap();
        let schema = Engine::default()
            .build(vec![SchemaDocument::from_spec(spec)])
            .unwrap();
        let top = schema.top_statement("acme").unwrap();
        let rendered = render_tree(&schema, top).unwrap();

        assert!(rendered.starts_with("module acme (urn:acme)\n"));
        assert!(rendered.contains("  ro container system\n"));
        assert!(rendered.contains("    ro leaf legacy [deprecated]\n"));
        assert!(rendered.contains("      status deprecated\n"));
    }
}
