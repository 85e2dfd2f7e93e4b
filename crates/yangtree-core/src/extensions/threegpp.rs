//! Extensions of the 3GPP common module

use super::{ExtensionArgument, ExtensionRule, MaxCardinality, TableSupplier};
use crate::statement::CoreKind;

pub const EXTENSIONS_MODULE: &str = "_3gpp-common-yang-extensions";

pub fn supplier() -> TableSupplier {
    TableSupplier::new("3gpp")
        .with_rule(
            ExtensionRule::new(EXTENSIONS_MODULE, "initial-value")
                .argument(ExtensionArgument::Mandatory)
                .max_cardinality(MaxCardinality::Multiple)
                .order_matters(),
        )
        .with_rule(
            ExtensionRule::new(EXTENSIONS_MODULE, "inVariant")
                .argument(ExtensionArgument::Forbidden)
                .parents(&[CoreKind::Leaf, CoreKind::LeafList, CoreKind::List])
                .also_under_deviate_or_refine(),
        )
        .with_rule(
            ExtensionRule::new(EXTENSIONS_MODULE, "notNotifyable")
                .argument(ExtensionArgument::Forbidden)
                .parents(&[
                    CoreKind::Leaf,
                    CoreKind::LeafList,
                    CoreKind::List,
                    CoreKind::Container,
                    CoreKind::Anydata,
                    CoreKind::Anyxml,
                ])
                .also_under_deviate_or_refine(),
        )
}
