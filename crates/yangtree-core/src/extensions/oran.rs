//! Extensions of the O-RAN SMO topology common module

use super::{ExtensionArgument, ExtensionRule, MaxCardinality, TableSupplier};
use crate::diagnostics::FindingKind;
use crate::result::Result;
use crate::statement::{BuildContext, CoreKind, CustomValue, ModuleId, NodeId, StatementKey};
use regex::Regex;
use std::sync::LazyLock;

pub const TEIV_EXTENSIONS_MODULE: &str = "o-ran-smo-teiv-common-yang-extensions";

/// Custom-data keys holding the parsed parts of a `label`
pub const LABEL_VERSION: &str = "label-version";
pub const LABEL_RELEASE: &str = "label-release";
pub const LABEL_CORRECTION: &str = "label-correction";

static LABEL_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)$").unwrap());

pub fn supplier() -> TableSupplier {
    TableSupplier::new("o-ran-teiv")
        .with_rule(
            ExtensionRule::new(TEIV_EXTENSIONS_MODULE, "biDirectionalTopologyRelationship")
                .argument(ExtensionArgument::Identifier)
                .max_cardinality(MaxCardinality::Multiple)
                .parents(&[CoreKind::Module])
                .post_check(check_relationship_sides),
        )
        .with_rule(
            ExtensionRule::new(TEIV_EXTENSIONS_MODULE, "aSide")
                .argument(ExtensionArgument::Identifier)
                .parents(&[CoreKind::Leaf, CoreKind::LeafList]),
        )
        .with_rule(
            ExtensionRule::new(TEIV_EXTENSIONS_MODULE, "bSide")
                .argument(ExtensionArgument::Identifier)
                .parents(&[CoreKind::Leaf, CoreKind::LeafList]),
        )
        .with_rule(ExtensionRule::new(TEIV_EXTENSIONS_MODULE, "domain"))
        .with_rule(
            ExtensionRule::new(TEIV_EXTENSIONS_MODULE, "label")
                .argument(ExtensionArgument::Mandatory)
                .parents(&[CoreKind::Revision])
                .value_pattern(
                    LABEL_FORMAT.clone(),
                    "Label value must be in 'version.release.correction' format.",
                )
                .post_check(record_label_parts),
        )
}

fn side_key(side: &str) -> StatementKey {
    StatementKey::new(ModuleId::new(TEIV_EXTENSIONS_MODULE), side)
}

/// A relationship needs exactly one leaf (or leaf-list) per side
fn check_relationship_sides(cx: &mut BuildContext<'_>, node: NodeId) -> Result<()> {
    for side in ["aSide", "bSide"] {
        let key = side_key(side);
        let mut annotated = 0;
        for child in cx.arena().children_of(node)? {
            let child_node = cx.arena().node(*child)?;
            if !(child_node.is(CoreKind::Leaf) || child_node.is(CoreKind::LeafList)) {
                continue;
            }
            if !cx.arena().children_with_key(*child, &key)?.is_empty() {
                annotated += 1;
            }
        }
        if annotated != 1 {
            cx.report_on(
                node,
                FindingKind::InvalidExtension,
                format!(
                    "A 'bi-directional relationship' must have as child exactly a single leaf or leaf-list annotated with '{side}'."
                ),
            )?;
        }
    }
    Ok(())
}

fn record_label_parts(cx: &mut BuildContext<'_>, node: NodeId) -> Result<()> {
    let argument = cx.arena().node(node)?.trimmed_argument().to_string();
    let Some(captures) = LABEL_FORMAT.captures(&argument) else {
        return Ok(());
    };
    let parts: Vec<i64> = (1..=3)
        .filter_map(|i| captures.get(i))
        .filter_map(|m| m.as_str().parse().ok())
        .collect();
    // components too large for i64 are left unrecorded
    if let [version, release, correction] = parts[..] {
        let label = cx.arena_mut().node_mut(node)?;
        label.set_custom_data(LABEL_VERSION, CustomValue::Int(version));
        label.set_custom_data(LABEL_RELEASE, CustomValue::Int(release));
        label.set_custom_data(LABEL_CORRECTION, CustomValue::Int(correction));
    }
    Ok(())
}
