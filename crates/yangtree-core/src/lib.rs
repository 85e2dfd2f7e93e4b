//! yangtree core
//!
//! Statement tree engine for YANG-like schema modules.
//! This crate builds typed statement trees from generic document trees,
//! enforces child cardinalities, dispatches extension statements to
//! pluggable suppliers, provides the tree mutation primitives used by
//! expansion passes, and resolves identities and features across modules.

pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod extensions;
pub mod registry;
pub mod result;
pub mod schema;
pub mod statement;

// Configuration system
pub use config::{
    ConfigLoader, EngineConfiguration, FindingSeverity, OrphanSubmodulePolicy,
};
pub use diagnostics::{
    DefaultFindingCollector, ElementRef, Finding, FindingCollector, FindingKind, FindingTarget,
    Severity, SeverityPolicy,
};
pub use dom::{DocumentSpec, DomElement, ElementSpec, ModulePrefixResolver, PrefixResolver};
pub use error::YangError;
pub use extensions::{
    ExtensionClass, ExtensionRule, GenericExtension, StatementClassSupplier, SupplierRegistry,
    TableSupplier,
};
pub use registry::{
    Feature, FeatureRegistry, IfFeatureExpr, Identity, IdentityRegistry, IdentityRegistryBuilder,
    RegistryError,
};
pub use result::Result;
pub use schema::{Engine, Schema, SchemaDocument};
pub use statement::{
    BuildContext, Cardinalities, ConformanceType, CoreKind, CustomValue, GrammarTable, MapGrammar,
    ModuleId, NodeId, Rfc7950Grammar, RootId, StatementArena, StatementFactory, StatementKey,
    StatementNode, Status,
};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yangtree=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
