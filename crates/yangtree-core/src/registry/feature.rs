//! Features, the supported-feature set and if-feature pruning

use super::if_feature::IfFeatureExpr;
use crate::diagnostics::{ElementRef, Finding, FindingKind, FindingTarget};
use crate::dom::PrefixResolver;
use crate::result::Result;
use crate::statement::{CoreKind, CustomValue, ModuleId, NodeId, RootId, StatementArena};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Custom-data key on a parent listing children removed by pruning
pub const REMOVED_BY_IF_FEATURE: &str = "removed-by-if-feature";

/// A named, optionally conditional capability
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Feature {
    pub namespace: String,
    pub module: ModuleId,
    pub local_name: String,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.local_name)
    }
}

type FeatureKey = (ModuleId, String);

/// One `if-feature` condition with the prefix context it was written in
#[derive(Debug, Clone)]
struct Condition {
    expr: IfFeatureExpr,
    resolver: Arc<dyn PrefixResolver>,
}

#[derive(Debug, Clone)]
struct FeatureEntry {
    feature: Feature,
    node: NodeId,
    element: ElementRef,
    conditions: Vec<Condition>,
}

/// Every known feature and which of them are supported
#[derive(Debug, Default)]
pub struct FeatureRegistry {
    features: IndexMap<FeatureKey, FeatureEntry>,
    supported: HashSet<FeatureKey>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the `feature` statements of `root`
    pub fn collect(&mut self, arena: &StatementArena, root: RootId) -> Result<()> {
        let Some(top) = arena.root(root)?.top_statement() else {
            return Ok(());
        };
        let namespace = arena.namespace_of_root(root)?.unwrap_or_default();
        for id in arena.children_of_kind(top, CoreKind::Feature)? {
            let statement = arena.node(id)?;
            let feature = Feature {
                namespace: namespace.clone(),
                module: statement.prefix_resolver().default_module(),
                local_name: statement.trimmed_argument().to_string(),
            };
            let entry = FeatureEntry {
                conditions: conditions_of(arena, id)?,
                node: id,
                element: statement.element_ref(),
                feature,
            };
            debug!("Collected feature {}", entry.feature);
            self.features.insert(
                (entry.feature.module.clone(), entry.feature.local_name.clone()),
                entry,
            );
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values().map(|e| &e.feature)
    }

    pub fn get(&self, module: &ModuleId, local_name: &str) -> Option<&Feature> {
        self.features
            .get(&(module.clone(), local_name.to_string()))
            .map(|e| &e.feature)
    }

    pub fn is_supported(&self, module: &ModuleId, local_name: &str) -> bool {
        self.supported
            .contains(&(module.clone(), local_name.to_string()))
    }

    pub fn supported_features(&self) -> Vec<&Feature> {
        self.features
            .iter()
            .filter(|(key, _)| self.supported.contains(*key))
            .map(|(_, e)| &e.feature)
            .collect()
    }

    /// Decide the supported set
    ///
    /// `requested` holds `module:feature` names; `None` requests every known
    /// feature. A feature stays supported only while its own if-feature
    /// conditions hold against the set; explicitly requested features that
    /// fail are reported as "cannot be supported".
    pub fn support(&mut self, requested: Option<&[String]>) -> Vec<Finding> {
        let explicit = requested.is_some();
        self.supported = match requested {
            None => self.features.keys().cloned().collect(),
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let key = name
                        .split_once(':')
                        .map(|(m, f)| (ModuleId::new(m), f.to_string()));
                    match key {
                        Some(key) if self.features.contains_key(&key) => Some(key),
                        _ => {
                            warn!("Requested feature '{}' is not defined by any module", name);
                            None
                        }
                    }
                })
                .collect(),
        };

        let mut findings = Vec::new();
        loop {
            let failing: Vec<FeatureKey> = self
                .supported
                .iter()
                .filter(|key| {
                    self.features
                        .get(*key)
                        .is_some_and(|e| !self.conditions_hold(&e.conditions))
                })
                .cloned()
                .collect();
            if failing.is_empty() {
                break;
            }
            for key in failing {
                self.supported.remove(&key);
                if explicit && let Some(entry) = self.features.get(&key) {
                    findings.push(Finding::new(
                        FindingTarget::Statement {
                            node: entry.node,
                            element: entry.element.clone(),
                        },
                        FindingKind::FeatureCannotBeSupported,
                        format!(
                            "Feature '{}' cannot be supported as its if-feature condition is not satisfied.",
                            entry.feature.local_name
                        ),
                    ));
                }
            }
        }
        findings.sort_by_key(|f| f.target.node());
        debug!("{} of {} features supported", self.supported.len(), self.features.len());
        findings
    }

    fn conditions_hold(&self, conditions: &[Condition]) -> bool {
        conditions.iter().all(|condition| {
            condition.expr.evaluate(&|name| {
                self.resolve_feature(name, condition.resolver.as_ref())
                    .is_some_and(|key| self.supported.contains(&key))
            })
        })
    }

    fn resolve_feature(&self, name: &str, resolver: &dyn PrefixResolver) -> Option<FeatureKey> {
        match name.split_once(':') {
            Some((prefix, local)) => resolver
                .module_for_prefix(prefix)
                .map(|module| (module, local.to_string())),
            None => Some((resolver.default_module(), name.to_string())),
        }
    }

    /// Whether the if-feature conditions of `node` hold
    ///
    /// Unresolvable prefixes count as unsupported and are returned as
    /// findings.
    pub fn is_satisfied(&self, arena: &StatementArena, node: NodeId) -> Result<(bool, Vec<Finding>)> {
        let mut findings = Vec::new();
        let conditions = conditions_of(arena, node)?;
        for id in arena.children_of_kind(node, CoreKind::IfFeature)? {
            let statement = arena.node(id)?;
            let Ok(expr) = IfFeatureExpr::parse(statement.trimmed_argument()) else {
                continue;
            };
            for name in expr.feature_names() {
                if let Some((prefix, _)) = name.split_once(':')
                    && statement.prefix_resolver().module_for_prefix(prefix).is_none()
                {
                    findings.push(Finding::new(
                        FindingTarget::Statement {
                            node: id,
                            element: statement.element_ref(),
                        },
                        FindingKind::UnresolvablePrefix,
                        format!("Prefix '{prefix}' of feature '{name}' not resolvable."),
                    ));
                }
            }
        }
        Ok((self.conditions_hold(&conditions), findings))
    }

    /// Remove every statement below `root`'s top statement whose if-feature
    /// conditions do not hold
    ///
    /// `feature` statements are never removed. The names of removed children
    /// are appended to the parent's [`REMOVED_BY_IF_FEATURE`] custom data.
    pub fn prune_unsatisfied(&self, arena: &mut StatementArena, root: RootId) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        let Some(top) = arena.root(root)?.top_statement() else {
            return Ok(findings);
        };
        let mut stack = vec![top];
        while let Some(parent) = stack.pop() {
            for child in arena.children_of(parent)?.to_vec() {
                let statement = arena.node(child)?;
                if statement.is(CoreKind::Feature) {
                    continue;
                }
                if arena.children_of_kind(child, CoreKind::IfFeature)?.is_empty() {
                    stack.push(child);
                    continue;
                }
                let (satisfied, mut problems) = self.is_satisfied(arena, child)?;
                findings.append(&mut problems);
                if satisfied {
                    stack.push(child);
                    continue;
                }
                let name = match arena.node(child)?.argument() {
                    Some(argument) => argument.to_string(),
                    None => arena.node(child)?.statement_name().to_string(),
                };
                debug!("Pruning '{}' under {}: if-feature not satisfied", name, parent);
                arena.remove_child(parent, child)?;
                arena.discard(child)?;
                arena
                    .node_mut(parent)?
                    .push_custom_data(REMOVED_BY_IF_FEATURE, CustomValue::Text(name));
            }
        }
        Ok(findings)
    }
}

fn conditions_of(arena: &StatementArena, node: NodeId) -> Result<Vec<Condition>> {
    let mut conditions = Vec::new();
    for id in arena.children_of_kind(node, CoreKind::IfFeature)? {
        let statement = arena.node(id)?;
        // malformed expressions were already reported while building
        if let Ok(expr) = IfFeatureExpr::parse(statement.trimmed_argument()) {
            conditions.push(Condition {
                expr,
                resolver: statement.prefix_resolver().clone(),
            });
        }
    }
    Ok(conditions)
}
