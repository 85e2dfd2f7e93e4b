//! Building a schema from a set of documents
//!
//! [`Engine::build`] runs the whole pipeline:
//!
//! 1. every document is built into a private arena (in parallel when
//!    configured), then the arenas are merged in input order;
//! 2. submodules are linked to their owning modules;
//! 3. effective attributes are assigned;
//! 4. identities and features are collected and resolved;
//! 5. optionally, statements whose if-feature conditions fail are pruned.
//!
//! Findings of all steps end up in the schema's collector. With fail-fast
//! configured, the first finding at or above the threshold aborts the build
//! with [`YangError::FailFast`].

use crate::config::{EngineConfiguration, OrphanSubmodulePolicy};
use crate::diagnostics::{
    DefaultFindingCollector, Finding, FindingCollector, FindingKind, SeverityPolicy,
};
use crate::dom::{DocumentSpec, DomElement};
use crate::error::YangError;
use crate::registry::{FeatureRegistry, IdentityRegistry, IdentityRegistryBuilder};
use crate::result::Result;
use crate::statement::{
    BuildContext, ConformanceType, CoreKind, GrammarTable, Instantiation, NodeId, Rfc7950Grammar,
    RootId, StatementArena, StatementFactory, Status,
};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One input document and how its module is used
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    element: Arc<DomElement>,
    source: Option<String>,
    conformance: ConformanceType,
}

impl SchemaDocument {
    /// An implemented document
    pub fn new(element: Arc<DomElement>) -> Self {
        let source = element.source().map(|s| s.to_string());
        Self {
            element,
            source,
            conformance: ConformanceType::Implement,
        }
    }

    pub fn from_spec(spec: DocumentSpec) -> Self {
        Self::new(spec.into_element())
    }

    /// Load a JSON or YAML document tree from disk
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_spec(DocumentSpec::load(path)?))
    }

    pub fn with_conformance(mut self, conformance: ConformanceType) -> Self {
        self.conformance = conformance;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn element(&self) -> &Arc<DomElement> {
        &self.element
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn conformance(&self) -> ConformanceType {
        self.conformance
    }
}

/// Result of building one document in isolation
struct DocumentBuild {
    arena: StatementArena,
    root: RootId,
    findings: Vec<Finding>,
}

/// Builds schemas from documents
pub struct Engine {
    config: EngineConfiguration,
    grammar: Arc<dyn GrammarTable>,
    factory: StatementFactory,
}

impl Engine {
    /// Engine with the built-in grammar and extension suppliers
    pub fn new(config: EngineConfiguration) -> Self {
        Self {
            config,
            grammar: Arc::new(Rfc7950Grammar),
            factory: StatementFactory::with_builtin_suppliers(),
        }
    }

    /// Replace the grammar table
    pub fn with_grammar(mut self, grammar: Arc<dyn GrammarTable>) -> Self {
        self.grammar = grammar;
        self
    }

    /// Replace the statement factory (and with it the supplier list)
    pub fn with_factory(mut self, factory: StatementFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn config(&self) -> &EngineConfiguration {
        &self.config
    }

    pub fn factory(&self) -> &StatementFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut StatementFactory {
        &mut self.factory
    }

    /// Build, link and resolve all documents
    pub fn build(&self, documents: Vec<SchemaDocument>) -> Result<Schema> {
        let policy = self.config.severity_policy()?;
        let parallel = self.config.parallel() && documents.len() > 1;
        debug!(
            "Building {} documents ({})",
            documents.len(),
            if parallel { "parallel" } else { "sequential" }
        );

        let builds: Vec<DocumentBuild> = if parallel {
            documents
                .par_iter()
                .map(|document| self.build_document(document, &policy))
                .collect::<Result<Vec<_>>>()?
        } else {
            documents
                .iter()
                .map(|document| self.build_document(document, &policy))
                .collect::<Result<Vec<_>>>()?
        };

        let mut schema = Schema::empty(policy);
        for build in builds {
            schema.merge(build);
        }

        self.link_modules(&mut schema)?;
        schema.apply_effective_attributes()?;
        self.resolve_features(&mut schema)?;
        self.resolve_identities(&mut schema, parallel)?;

        info!(
            "Built {} trees with {} statements, {} findings",
            schema.arena.root_count(),
            schema.arena.len(),
            schema.findings.total_count()
        );
        Ok(schema)
    }

    fn context<'a>(
        &'a self,
        arena: &'a mut StatementArena,
        collector: &'a mut DefaultFindingCollector,
    ) -> BuildContext<'a> {
        BuildContext::new(arena, self.grammar.as_ref(), &self.factory, collector)
            .with_fail_fast(self.config.fail_fast())
    }

    fn build_document(&self, document: &SchemaDocument, policy: &SeverityPolicy) -> Result<DocumentBuild> {
        let mut arena = StatementArena::new();
        let mut collector = DefaultFindingCollector::with_policy(policy.clone());
        let root = arena.add_root(document.source.clone(), document.conformance);
        let element = &document.element;

        if !matches!(element.name(), "module" | "submodule") {
            self.context(&mut arena, &mut collector).report_on_element(
                element,
                FindingKind::InvalidRootStatement,
                "Expected either 'module' or 'submodule' as root-statement in the document.",
            )?;
        } else {
            let outcome = self.factory.instantiate(&mut arena, element, None, root)?;
            let mut cx = self.context(&mut arena, &mut collector);
            match outcome {
                Instantiation::Created(top) => {
                    cx.arena_mut().set_top_statement(root, top)?;
                    cx.process(top)?;
                }
                Instantiation::Rejected(finding) => cx.report(finding)?,
            }
        }

        debug!(
            "Built '{}' with {} statements",
            document.source().unwrap_or(element.name()),
            arena.len()
        );
        Ok(DocumentBuild {
            arena,
            root,
            findings: collector.drain(),
        })
    }

    /// Resolve `include` and `belongs-to` between the built trees
    fn link_modules(&self, schema: &mut Schema) -> Result<()> {
        let mut modules: IndexMap<String, RootId> = IndexMap::new();
        let mut submodules: IndexMap<String, RootId> = IndexMap::new();
        for root in schema.arena.roots() {
            let Some(top) = root.top_statement().and_then(|t| schema.arena.get(t)) else {
                continue;
            };
            let table = if top.is(CoreKind::Module) {
                &mut modules
            } else {
                &mut submodules
            };
            let name = top.trimmed_argument().to_string();
            if table.contains_key(&name) {
                warn!("'{}' is defined by more than one document; using the first", name);
                continue;
            }
            table.insert(name, root.id());
        }

        let Schema {
            arena, findings, ..
        } = schema;
        let mut cx = self.context(arena, findings);

        for &module_root in modules.values() {
            let Some(top) = cx.arena().root(module_root)?.top_statement() else {
                continue;
            };
            for include in cx.arena().children_of_kind(top, CoreKind::Include)? {
                let name = cx.arena().node(include)?.trimmed_argument().to_string();
                if !submodules.contains_key(&name) {
                    cx.report_on(
                        include,
                        FindingKind::UnresolvableInclude,
                        format!("Submodule {name} not found in input."),
                    )?;
                }
            }
        }

        for &submodule_root in submodules.values() {
            let Some(top) = cx.arena().root(submodule_root)?.top_statement() else {
                continue;
            };
            let Some(belongs_to) = cx.arena().first_child_of_kind(top, CoreKind::BelongsTo)? else {
                continue;
            };
            let owner_name = cx.arena().node(belongs_to)?.trimmed_argument().to_string();
            let submodule_name = cx.arena().node(top)?.trimmed_argument().to_string();

            let Some(&owner) = modules.get(&owner_name) else {
                cx.report_on(
                    belongs_to,
                    FindingKind::UnresolvableBelongsTo,
                    format!("Owning module '{owner_name}' not found in input."),
                )?;
                if self.config.orphan_submodule_policy() == OrphanSubmodulePolicy::EmitFinding {
                    cx.report_on(
                        top,
                        FindingKind::OrphanSubmodule,
                        format!(
                            "Submodule '{submodule_name}' has no owning module in the input; its namespace is unresolved."
                        ),
                    )?;
                }
                continue;
            };

            cx.arena_mut().link_submodule(owner, submodule_root)?;
            debug!("Linked submodule '{}' to '{}'", submodule_name, owner_name);

            let owner_top = cx.arena().root(owner)?.top_statement();
            let included = match owner_top {
                Some(owner_top) => cx
                    .arena()
                    .children_of_kind(owner_top, CoreKind::Include)?
                    .into_iter()
                    .filter_map(|i| cx.arena().get(i))
                    .any(|i| i.trimmed_argument() == submodule_name),
                None => false,
            };
            if !included {
                cx.report_on(
                    top,
                    FindingKind::OrphanSubmodule,
                    format!("Owning module '{owner_name}' does not 'include' this submodule."),
                )?;
            }
        }

        schema.modules = modules;
        schema.submodules = submodules;
        Ok(())
    }

    fn resolve_identities(&self, schema: &mut Schema, parallel: bool) -> Result<()> {
        let builder = IdentityRegistryBuilder::new();
        let roots: Vec<RootId> = schema.arena.roots().map(|r| r.id()).collect();
        let arena = &schema.arena;

        let collected: Vec<Vec<Finding>> = if parallel {
            roots
                .par_iter()
                .map(|root| builder.collect(arena, *root))
                .collect::<Result<Vec<_>>>()?
        } else {
            roots
                .iter()
                .map(|root| builder.collect(arena, *root))
                .collect::<Result<Vec<_>>>()?
        };

        let (registry, graph_findings) = builder.build();
        debug!("{} identities registered", registry.len());
        schema.identities = registry;

        let findings = collected.into_iter().flatten().chain(graph_findings).collect();
        self.report_all(schema, findings)
    }

    fn resolve_features(&self, schema: &mut Schema) -> Result<()> {
        let mut registry = FeatureRegistry::new();
        let roots: Vec<RootId> = schema.arena.roots().map(|r| r.id()).collect();
        for root in &roots {
            registry.collect(&schema.arena, *root)?;
        }

        let findings = registry.support(self.config.supported_features());
        self.report_all(schema, findings)?;

        if self.config.remove_nodes_not_satisfying_if_feature() {
            let mut findings = Vec::new();
            for root in &roots {
                findings.extend(registry.prune_unsatisfied(&mut schema.arena, *root)?);
            }
            self.report_all(schema, findings)?;
        }

        schema.features = registry;
        Ok(())
    }

    fn report_all(&self, schema: &mut Schema, findings: Vec<Finding>) -> Result<()> {
        let mut cx = self.context(&mut schema.arena, &mut schema.findings);
        for finding in findings {
            cx.report(finding)?;
        }
        Ok(())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfiguration::default())
    }
}

/// Built statement trees plus the registries resolved over them
#[derive(Debug)]
pub struct Schema {
    arena: StatementArena,
    identities: IdentityRegistry,
    features: FeatureRegistry,
    findings: DefaultFindingCollector,
    modules: IndexMap<String, RootId>,
    submodules: IndexMap<String, RootId>,
}

impl Schema {
    fn empty(policy: SeverityPolicy) -> Self {
        Self {
            arena: StatementArena::new(),
            identities: IdentityRegistry::default(),
            features: FeatureRegistry::new(),
            findings: DefaultFindingCollector::with_policy(policy),
            modules: IndexMap::new(),
            submodules: IndexMap::new(),
        }
    }

    fn merge(&mut self, build: DocumentBuild) {
        let (node_offset, root_offset) = self.arena.absorb(build.arena);
        debug!(
            "Merged root {} at node offset {}",
            build.root.shifted(root_offset),
            node_offset
        );
        for mut finding in build.findings {
            finding.shift_nodes(node_offset);
            self.findings.add(finding);
        }
    }

    pub fn arena(&self) -> &StatementArena {
        &self.arena
    }

    /// Mutable access for tree rewrites; re-run
    /// [`Schema::apply_effective_attributes`] afterwards
    pub fn arena_mut(&mut self) -> &mut StatementArena {
        &mut self.arena
    }

    pub fn identities(&self) -> &IdentityRegistry {
        &self.identities
    }

    pub fn features(&self) -> &FeatureRegistry {
        &self.features
    }

    pub fn findings(&self) -> &DefaultFindingCollector {
        &self.findings
    }

    pub fn findings_mut(&mut self) -> &mut DefaultFindingCollector {
        &mut self.findings
    }

    pub fn has_errors(&self) -> bool {
        self.findings.has_errors()
    }

    /// Root of the module with the given name
    pub fn module_root(&self, name: &str) -> Option<RootId> {
        self.modules.get(name).copied()
    }

    /// Root of the submodule with the given name
    pub fn submodule_root(&self, name: &str) -> Option<RootId> {
        self.submodules.get(name).copied()
    }

    /// Top statement of the module or submodule with the given name
    pub fn top_statement(&self, name: &str) -> Option<NodeId> {
        let root = self.module_root(name).or_else(|| self.submodule_root(name))?;
        self.arena.root(root).ok()?.top_statement()
    }

    /// Namespace that statements of `root` resolve to
    pub fn namespace_of(&self, root: RootId) -> Result<Option<String>> {
        self.arena.namespace_of_root(root)
    }

    /// Assign namespace, conformance, status and config to every tree
    pub fn apply_effective_attributes(&mut self) -> Result<()> {
        let roots: Vec<(RootId, Option<NodeId>, ConformanceType)> = self
            .arena
            .roots()
            .map(|r| (r.id(), r.top_statement(), r.conformance()))
            .collect();
        for (root, top, conformance) in roots {
            let Some(top) = top else {
                continue;
            };
            if !self.arena.contains(top) {
                return Err(YangError::NodeNotFound { id: top.index() as u32 });
            }
            let namespace = self.arena.namespace_of_root(root)?;
            self.arena.assign_effective_namespace(top, namespace.as_deref())?;
            self.arena.assign_effective_conformance(top, conformance)?;
            self.arena.assign_effective_status(top, Status::Current)?;
            self.arena.assign_effective_config(top, true)?;
        }
        Ok(())
    }
}
