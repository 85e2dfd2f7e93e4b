//! Extensions defined by IETF modules

use super::{ExtensionArgument, ExtensionRule, MaxCardinality, TableSupplier};
use crate::diagnostics::FindingKind;
use crate::result::Result;
use crate::statement::{BuildContext, CoreKind, NodeId};

pub const SCHEMA_MOUNT_MODULE: &str = "ietf-yang-schema-mount";
pub const METADATA_MODULE: &str = "ietf-yang-metadata";
pub const NETCONF_ACM_MODULE: &str = "ietf-netconf-acm";

const DATA_NODES: &[CoreKind] = &[
    CoreKind::Leaf,
    CoreKind::LeafList,
    CoreKind::List,
    CoreKind::Container,
    CoreKind::Anydata,
    CoreKind::Anyxml,
];

/// Supplier for `mount-point`, `annotation`, `default-deny-write` and
/// `default-deny-all`
pub fn supplier() -> TableSupplier {
    TableSupplier::new("ietf")
        .with_rule(
            ExtensionRule::new(SCHEMA_MOUNT_MODULE, "mount-point")
                .argument(ExtensionArgument::Identifier)
                .parents(&[CoreKind::List, CoreKind::Container])
                .also_under_deviate_or_refine(),
        )
        .with_rule(
            ExtensionRule::new(METADATA_MODULE, "annotation")
                .argument(ExtensionArgument::Identifier)
                .max_cardinality(MaxCardinality::Multiple)
                .parents(&[CoreKind::Module, CoreKind::Submodule])
                .post_check(check_annotation_type),
        )
        .with_rule(
            ExtensionRule::new(NETCONF_ACM_MODULE, "default-deny-write")
                .argument(ExtensionArgument::Forbidden)
                .parents(DATA_NODES)
                .also_under_deviate_or_refine(),
        )
        .with_rule(
            ExtensionRule::new(NETCONF_ACM_MODULE, "default-deny-all")
                .argument(ExtensionArgument::Forbidden)
                .parents(DATA_NODES)
                .also_under_deviate_or_refine(),
        )
}

/// An annotation carries exactly one `type`
fn check_annotation_type(cx: &mut BuildContext<'_>, node: NodeId) -> Result<()> {
    let types = cx.arena().children_of_kind(node, CoreKind::Type)?.len();
    if types != 1 {
        cx.report_on(
            node,
            FindingKind::MissingRequiredChild,
            "A 'type' statement is required for the annotation.",
        )?;
    }
    Ok(())
}
