//! The statement tree: keys, kinds, nodes, the arena that owns them and the
//! grammar-driven builder that populates it

mod builder;
mod effective;
mod factory;
mod grammar;
mod key;
mod kind;
mod node;
mod tree;
mod validate;

pub use builder::BuildContext;
pub use factory::{Instantiation, StatementFactory};
pub use grammar::{Cardinalities, GrammarTable, MapGrammar, Rfc7950Grammar};
pub use key::{CORE_MODULE_NAME, ModuleId, StatementKey};
pub use kind::{ArgumentRule, CoreKind};
pub use node::{
    ConformanceType, CustomValue, ExtensionVariant, NodeId, RootId, StatementNode,
    StatementVariant, Status, SupplierId,
};
pub use tree::{StatementArena, TreeRoot};
pub use validate::{is_identifier, is_identifier_ref};
