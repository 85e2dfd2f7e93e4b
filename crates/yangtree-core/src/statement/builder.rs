//! Grammar-driven population of statement subtrees
//!
//! [`BuildContext::process`] is called once for a freshly created node. It
//! pulls the node's children out of the document element according to the
//! grammar table, creates them through the factory, recurses, validates the
//! node and finally reports every document child that was not consumed.
//!
//! Extension statements have no grammar entry: every unprefixed child becomes
//! a core statement and every prefixed child another extension.

use super::grammar::{Cardinalities, GrammarTable};
use super::factory::{Instantiation, StatementFactory};
use super::kind::CoreKind;
use super::node::{NodeId, StatementVariant};
use super::tree::StatementArena;
use crate::diagnostics::{Finding, FindingCollector, FindingKind, FindingTarget, Severity};
use crate::dom::DomElement;
use crate::error::YangError;
use crate::result::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::trace;

/// Everything a builder pass needs, borrowed for its duration
pub struct BuildContext<'a> {
    arena: &'a mut StatementArena,
    grammar: &'a dyn GrammarTable,
    factory: &'a StatementFactory,
    collector: &'a mut dyn FindingCollector,
    fail_fast: Option<Severity>,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        arena: &'a mut StatementArena,
        grammar: &'a dyn GrammarTable,
        factory: &'a StatementFactory,
        collector: &'a mut dyn FindingCollector,
    ) -> Self {
        Self {
            arena,
            grammar,
            factory,
            collector,
            fail_fast: None,
        }
    }

    /// Abort with [`YangError::FailFast`] at the first finding whose
    /// severity is at least `threshold`
    pub fn with_fail_fast(mut self, threshold: Option<Severity>) -> Self {
        self.fail_fast = threshold;
        self
    }

    pub fn arena(&self) -> &StatementArena {
        &*self.arena
    }

    pub fn arena_mut(&mut self) -> &mut StatementArena {
        &mut *self.arena
    }

    pub fn factory(&self) -> &StatementFactory {
        self.factory
    }

    /// Record a finding with the collector and on the statement it targets
    ///
    /// Suppressed findings are dropped entirely.
    pub fn report(&mut self, finding: Finding) -> Result<()> {
        let Some(severity) = self.collector.severity_of(&finding) else {
            return Ok(());
        };
        self.arena.attach_finding(&finding);
        if self.fail_fast.is_some_and(|threshold| severity >= threshold) {
            self.collector.add(finding.clone());
            return Err(YangError::fail_fast(finding));
        }
        self.collector.add(finding);
        Ok(())
    }

    /// Report a finding on a statement
    pub fn report_on(
        &mut self,
        node: NodeId,
        kind: FindingKind,
        message: impl Into<String>,
    ) -> Result<()> {
        let element = self.arena.node(node)?.element_ref();
        self.report(Finding::new(
            FindingTarget::Statement { node, element },
            kind,
            message,
        ))
    }

    /// Report a finding on a document element that has no statement
    pub fn report_on_element(
        &mut self,
        element: &DomElement,
        kind: FindingKind,
        message: impl Into<String>,
    ) -> Result<()> {
        self.report(Finding::new(
            FindingTarget::Element(element.element_ref()),
            kind,
            message,
        ))
    }

    /// Create a child statement for `element` under `parent` and build it
    pub fn extract_child(&mut self, parent: NodeId, element: &Arc<DomElement>) -> Result<Option<NodeId>> {
        let root = self.arena.node(parent)?.root();
        match self.factory.instantiate(self.arena, element, Some(parent), root)? {
            Instantiation::Created(child) => {
                self.process(child)?;
                Ok(Some(child))
            }
            Instantiation::Rejected(finding) => {
                self.report(finding)?;
                Ok(None)
            }
        }
    }

    /// Populate and validate the subtree of a freshly created node
    pub fn process(&mut self, node: NodeId) -> Result<()> {
        let statement = self.arena.node(node)?;
        let element = statement.element().clone();
        trace!("Processing {} '{}'", node, element.name());

        match statement.variant().clone() {
            StatementVariant::Extension(extension) => {
                for child in element.children() {
                    if !child.is_prefixed() {
                        self.extract_child(node, child)?;
                    }
                }
                self.extract_extensions(node, &element)?;
                extension.class.validate(self, node)?;
                extension.class.subtree_processed(self, node)
            }
            StatementVariant::Core(kind) => self.process_core(node, kind, &element),
        }
    }

    fn process_core(&mut self, node: NodeId, kind: CoreKind, element: &Arc<DomElement>) -> Result<()> {
        let grammar = self.grammar;
        let empty = Cardinalities::default();
        let cardinalities = grammar.cardinalities(kind.keyword()).unwrap_or(&empty);

        self.extract_singletons(node, element, &cardinalities.mandatory_singleton)?;
        self.extract_multiples(node, element, &cardinalities.mandatory_multiple)?;
        self.extract_singletons(node, element, &cardinalities.optional_singleton)?;
        self.extract_multiples(node, element, &cardinalities.optional_multiple)?;

        for name in &cardinalities.mandatory_singleton {
            if !has_child(element, name) {
                self.report_on(
                    node,
                    FindingKind::MissingRequiredChild,
                    format!("Statement '{}' required under '{}'.", name, element.name()),
                )?;
            }
        }
        for name in &cardinalities.mandatory_multiple {
            if !has_child(element, name) {
                self.report_on(
                    node,
                    FindingKind::MissingRequiredChild,
                    format!(
                        "Statement '{}' required at least once under '{}'.",
                        name,
                        element.name()
                    ),
                )?;
            }
        }

        self.extract_extensions(node, element)?;
        self.validate_core(node, kind)?;
        self.post_process_core(node, kind)?;
        self.report_unexpected_children(element, cardinalities)?;
        self.record_document_order(node)
    }

    /// Extract, in document order, the first child for each of `names`;
    /// repeated ones are cardinality violations reported on `node`
    fn extract_singletons(
        &mut self,
        node: NodeId,
        element: &Arc<DomElement>,
        names: &[String],
    ) -> Result<()> {
        let mut seen = HashSet::new();
        for child in element.children().iter().filter(|c| names.iter().any(|n| n == c.name())) {
            if !seen.insert(child.name()) {
                self.report_on(
                    node,
                    FindingKind::CardinalityViolation,
                    format!(
                        "Child statement '{}' cannot exist more than once under '{}'.",
                        child.name(),
                        element.name()
                    ),
                )?;
                continue;
            }
            self.extract_child(node, child)?;
        }
        Ok(())
    }

    fn extract_multiples(
        &mut self,
        node: NodeId,
        element: &Arc<DomElement>,
        names: &[String],
    ) -> Result<()> {
        for child in element.children().iter().filter(|c| names.iter().any(|n| n == c.name())) {
            self.extract_child(node, child)?;
        }
        Ok(())
    }

    fn extract_extensions(&mut self, node: NodeId, element: &Arc<DomElement>) -> Result<()> {
        for child in element.children().iter().filter(|c| c.is_prefixed()) {
            self.extract_child(node, child)?;
        }
        Ok(())
    }

    fn report_unexpected_children(
        &mut self,
        element: &Arc<DomElement>,
        cardinalities: &Cardinalities,
    ) -> Result<()> {
        let mut reported = HashSet::new();
        for child in element.children() {
            if child.is_prefixed() || cardinalities.allows(child.name()) {
                continue;
            }
            if !reported.insert(child.name()) {
                continue;
            }
            if CoreKind::is_core_keyword(child.name()) {
                self.report_on_element(
                    child,
                    FindingKind::IllegalChildStatement,
                    format!(
                        "Statement '{}' is not allowed under '{}'.",
                        child.name(),
                        element.name()
                    ),
                )?;
            } else {
                self.report_on_element(
                    child,
                    FindingKind::InvalidSyntax,
                    format!("'{}' is not part of the core YANG language.", child.name()),
                )?;
            }
        }
        Ok(())
    }

    /// Number order-sensitive children by their position among siblings of
    /// the same key
    fn record_document_order(&mut self, node: NodeId) -> Result<()> {
        let children = self.arena.children_of(node)?.to_vec();
        let mut ordered: Vec<(NodeId, usize)> = Vec::new();
        for child in &children {
            let statement = self.arena.node(*child)?;
            let matters = match statement.variant() {
                StatementVariant::Core(kind) => kind.order_under_parent_matters(),
                StatementVariant::Extension(ext) => ext.class.order_under_parent_matters(),
            };
            if !matters {
                continue;
            }
            let position = children
                .iter()
                .take_while(|c| *c != child)
                .filter(|c| {
                    self.arena
                        .get(**c)
                        .is_some_and(|s| s.key() == statement.key())
                })
                .count();
            ordered.push((*child, position));
        }
        for (child, position) in ordered {
            self.arena.node_mut(child)?.document_order = Some(position);
        }
        Ok(())
    }
}

fn has_child(element: &DomElement, name: &str) -> bool {
    element.children().iter().any(|c| c.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DefaultFindingCollector;
    use crate::dom::{DomElement, ModulePrefixResolver, PrefixResolver};
    use crate::statement::{ConformanceType, MapGrammar, Rfc7950Grammar};

    fn el(name: &str, value: Option<&str>, children: Vec<DomElement>) -> DomElement {
        let resolver: Arc<dyn PrefixResolver> = Arc::new(ModulePrefixResolver::new("m"));
        DomElement::new(name, value, resolver).with_children(children)
    }

    fn build(
        element: DomElement,
        grammar: &dyn GrammarTable,
    ) -> (StatementArena, NodeId, DefaultFindingCollector) {
        let factory = StatementFactory::default();
        let mut arena = StatementArena::new();
        let mut collector = DefaultFindingCollector::new();
        let root = arena.add_root(None, ConformanceType::Implement);
        let element = Arc::new(element);
        let Instantiation::Created(top) = factory
            .instantiate(&mut arena, &element, None, root)
            .unwrap()
        else {
            panic!("top statement not created");
        };
        arena.set_top_statement(root, top).unwrap();
        BuildContext::new(&mut arena, grammar, &factory, &mut collector)
            .process(top)
            .unwrap();
        (arena, top, collector)
    }

    fn module(children: Vec<DomElement>) -> DomElement {
        let mut all = vec![
            el("namespace", Some("urn:m"), vec![]),
            el("prefix", Some("m"), vec![]),
        ];
        all.extend(children);
        el("module", Some("m"), all)
    }

    #[test]
    fn test_missing_mandatory_singleton() {
        let (arena, top, collector) = build(
            module(vec![el("leaf", Some("l"), vec![])]),
            &Rfc7950Grammar,
        );
        let leaf = arena.first_child_of_kind(top, CoreKind::Leaf).unwrap().unwrap();

        let missing = collector.findings_of_kind(FindingKind::MissingRequiredChild);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].message, "Statement 'type' required under 'leaf'.");
        assert_eq!(missing[0].target.node(), Some(leaf));
        assert!(arena.children_of_kind(leaf, CoreKind::Type).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_singleton_keeps_first() {
        let (arena, top, collector) = build(
            module(vec![el(
                "leaf",
                Some("l"),
                vec![
                    el("type", Some("string"), vec![]),
                    el("type", Some("int32"), vec![]),
                ],
            )]),
            &Rfc7950Grammar,
        );
        let leaf = arena.first_child_of_kind(top, CoreKind::Leaf).unwrap().unwrap();
        let types = arena.children_of_kind(leaf, CoreKind::Type).unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(arena.node(types[0]).unwrap().argument(), Some("string"));

        let violations = collector.findings_of_kind(FindingKind::CardinalityViolation);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].target.node(), Some(leaf));
        assert_eq!(
            violations[0].message,
            "Child statement 'type' cannot exist more than once under 'leaf'."
        );
    }

    #[test]
    fn test_mandatory_multiple_missing() {
        let (_, _, collector) = build(
            module(vec![el("deviation", Some("/m:x"), vec![])]),
            &Rfc7950Grammar,
        );
        let missing = collector.findings_of_kind(FindingKind::MissingRequiredChild);
        assert_eq!(missing.len(), 1);
        assert_eq!(
            missing[0].message,
            "Statement 'deviate' required at least once under 'deviation'."
        );
    }

    #[test]
    fn test_illegal_and_unknown_children() {
        let (arena, top, collector) = build(
            module(vec![el("key", Some("k"), vec![]), el("bogus", None, vec![])]),
            &Rfc7950Grammar,
        );
        let illegal = collector.findings_of_kind(FindingKind::IllegalChildStatement);
        assert_eq!(illegal.len(), 1);
        assert_eq!(illegal[0].message, "Statement 'key' is not allowed under 'module'.");
        assert!(illegal[0].target.node().is_none());

        let syntax = collector.findings_of_kind(FindingKind::InvalidSyntax);
        assert_eq!(syntax[0].message, "'bogus' is not part of the core YANG language.");
        assert_eq!(arena.children_of(top).unwrap().len(), 2);
    }

    #[test]
    fn test_order_sensitive_children_record_position() {
        let grammar = MapGrammar::rfc7950();
        let (arena, top, _) = build(
            module(vec![el(
                "leaf-list",
                Some("ll"),
                vec![
                    el("type", Some("string"), vec![]),
                    el("default", Some("a"), vec![]),
                    el("default", Some("b"), vec![]),
                ],
            )]),
            &grammar,
        );
        let leaf_list = arena.first_child_of_kind(top, CoreKind::LeafList).unwrap().unwrap();
        let defaults = arena.children_of_kind(leaf_list, CoreKind::Default).unwrap();
        let orders: Vec<_> = defaults
            .iter()
            .map(|d| arena.node(*d).unwrap().document_order())
            .collect();
        assert_eq!(orders, vec![Some(0), Some(1)]);
        let namespace = arena.first_child_of_kind(top, CoreKind::Namespace).unwrap().unwrap();
        assert_eq!(arena.node(namespace).unwrap().document_order(), None);
    }

    #[test]
    fn test_fail_fast_stops_at_first_error() {
        let factory = StatementFactory::default();
        let mut arena = StatementArena::new();
        let mut collector = DefaultFindingCollector::new();
        let root = arena.add_root(None, ConformanceType::Implement);
        let element = Arc::new(module(vec![el("leaf", Some("l"), vec![]), el("bogus", None, vec![])]));
        let Instantiation::Created(top) = factory.instantiate(&mut arena, &element, None, root).unwrap()
        else {
            panic!("top statement not created");
        };

        let err = BuildContext::new(&mut arena, &Rfc7950Grammar, &factory, &mut collector)
            .with_fail_fast(Some(Severity::Error))
            .process(top)
            .unwrap_err();
        assert!(matches!(err, YangError::FailFast { .. }));
        assert_eq!(collector.total_count(), 1);
    }
    #[test]
    fn test_children_keep_document_order_within_class() {
        let (arena, top, collector) = build(
            module(vec![
                el("leaf", Some("a"), vec![el("type", Some("string"), vec![])]),
                el("container", Some("b"), vec![]),
                el("leaf", Some("c"), vec![el("type", Some("string"), vec![])]),
            ]),
            &Rfc7950Grammar,
        );
        assert_eq!(collector.total_count(), 0);
        let names: Vec<_> = arena
            .children_of(top)
            .unwrap()
            .iter()
            .map(|c| arena.node(*c).unwrap())
            .filter(|n| n.is(CoreKind::Leaf) || n.is(CoreKind::Container))
            .map(|n| n.trimmed_argument().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_enum_and_bit_without_value_warn() {
        let (arena, _, collector) = build(
            module(vec![
                el(
                    "typedef",
                    Some("colour"),
                    vec![el(
                        "type",
                        Some("enumeration"),
                        vec![
                            el("enum", Some("red"), vec![el("value", Some("1"), vec![])]),
                            el("enum", Some("blue"), vec![]),
                        ],
                    )],
                ),
                el(
                    "typedef",
                    Some("flags"),
                    vec![el("type", Some("bits"), vec![el("bit", Some("ready"), vec![])])],
                ),
            ]),
            &Rfc7950Grammar,
        );
        let enums = collector.findings_of_kind(FindingKind::EnumWithoutValue);
        assert_eq!(enums.len(), 1);
        assert_eq!(enums[0].message, "enum 'blue' does not have a value (bad practice).");
        assert_eq!(collector.severity_of(enums[0]), Some(Severity::Warning));

        let bits = collector.findings_of_kind(FindingKind::BitWithoutPosition);
        assert_eq!(bits.len(), 1);
        assert_eq!(bits[0].message, "bit 'ready' does not have a position (bad practice).");
        assert!(arena.node(bits[0].target.node().unwrap()).unwrap().is(CoreKind::Bit));
        assert_eq!(collector.total_count(), 2);
    }

    fn deviation(operation: &str, children: Vec<DomElement>) -> DomElement {
        module(vec![el(
            "deviation",
            Some("/m:x"),
            vec![el("deviate", Some(operation), children)],
        )])
    }

    #[test]
    fn test_deviate_not_supported_rejects_children() {
        let (arena, _, collector) = build(
            deviation("not-supported", vec![el("units", Some("s"), vec![])]),
            &Rfc7950Grammar,
        );
        let illegal = collector.findings_of_kind(FindingKind::IllegalChildStatement);
        assert_eq!(illegal.len(), 1);
        assert_eq!(
            illegal[0].message,
            "Statement 'units' cannot occur under 'deviate not-supported'."
        );
        let target = illegal[0].target.node().unwrap();
        assert!(arena.node(target).unwrap().is(CoreKind::Units));
    }

    #[test]
    fn test_deviate_without_children() {
        let (_, _, collector) = build(deviation("replace", vec![]), &Rfc7950Grammar);
        let missing = collector.findings_of_kind(FindingKind::MissingRequiredChild);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].message, "Statements are required under 'deviate replace'.");

        let (_, _, collector) = build(deviation("not-supported", vec![]), &Rfc7950Grammar);
        assert_eq!(collector.total_count(), 0);
    }

    #[test]
    fn test_deviate_add_rejects_always_present_properties() {
        let (arena, _, collector) = build(
            deviation(
                "add",
                vec![
                    el("mandatory", Some("true"), vec![]),
                    el("units", Some("s"), vec![]),
                ],
            ),
            &Rfc7950Grammar,
        );
        let invalid = collector.findings_of_kind(FindingKind::InvalidDeviateProperty);
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].kind.code(), "P167");
        let target = invalid[0].target.node().unwrap();
        assert!(arena.node(target).unwrap().is(CoreKind::Mandatory));

        let (_, _, collector) = build(
            deviation("replace", vec![el("mandatory", Some("true"), vec![])]),
            &Rfc7950Grammar,
        );
        assert_eq!(collector.total_count(), 0);
    }
}
