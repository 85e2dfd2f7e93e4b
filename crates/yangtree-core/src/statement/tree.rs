//! Arena of statement nodes and the tree mutation primitives
//!
//! Nodes are addressed by [`NodeId`]. A parent owns its children through the
//! `children` list; `parent` and `root` are plain indices pointing back up.
//! Every structural change goes through the primitives below, which keep
//! both directions consistent:
//!
//! - [`StatementArena::add_child`] unlinks a node from its old parent first,
//!   so a node always has exactly one owner.
//! - [`StatementArena::remove_child`] returns the vacated index so callers can
//!   reinsert a replacement at the same position.
//! - [`StatementArena::replace_child_in_place`] and
//!   [`StatementArena::replace_children_with`] build on those two.
//! - [`StatementArena::clone_subtree`] copies a subtree under a new parent,
//!   keeping the original document elements (and thereby the original prefix
//!   context).
//!
//! Slots of discarded nodes are never reused, so a stale id is reported as
//! [`YangError::NodeNotFound`] instead of silently aliasing a newer node.

use super::key::StatementKey;
use super::kind::CoreKind;
use super::node::{ConformanceType, NodeId, RootId, StatementNode};
use crate::diagnostics::Finding;
use crate::error::YangError;
use crate::result::Result;
use tracing::trace;

/// One module or submodule tree inside the arena
#[derive(Debug, Clone)]
pub struct TreeRoot {
    pub(crate) id: RootId,
    pub(crate) source: Option<String>,
    pub(crate) top: Option<NodeId>,
    pub(crate) owner: Option<RootId>,
    pub(crate) owned_submodules: Vec<RootId>,
    pub(crate) conformance: ConformanceType,
}

impl TreeRoot {
    pub fn id(&self) -> RootId {
        self.id
    }

    /// Document name this tree was built from
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// The `module` or `submodule` statement, once built
    pub fn top_statement(&self) -> Option<NodeId> {
        self.top
    }

    /// Root of the module owning this submodule; `None` for modules and
    /// orphaned submodules
    pub fn owner(&self) -> Option<RootId> {
        self.owner
    }

    /// Roots of the submodules included by this module
    pub fn owned_submodules(&self) -> &[RootId] {
        &self.owned_submodules
    }

    pub fn conformance(&self) -> ConformanceType {
        self.conformance
    }
}

/// Owner of all statement nodes of one or more module trees
#[derive(Debug, Clone, Default)]
pub struct StatementArena {
    nodes: Vec<Option<StatementNode>>,
    roots: Vec<TreeRoot>,
}

impl StatementArena {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- roots ----

    /// Register a new, still empty tree root
    pub fn add_root(&mut self, source: Option<String>, conformance: ConformanceType) -> RootId {
        let id = RootId(self.roots.len() as u32);
        self.roots.push(TreeRoot {
            id,
            source,
            top: None,
            owner: None,
            owned_submodules: Vec::new(),
            conformance,
        });
        id
    }

    pub fn root(&self, id: RootId) -> Result<&TreeRoot> {
        self.roots
            .get(id.index())
            .ok_or(YangError::RootNotFound { id: id.0 })
    }

    pub(crate) fn root_mut(&mut self, id: RootId) -> Result<&mut TreeRoot> {
        self.roots
            .get_mut(id.index())
            .ok_or(YangError::RootNotFound { id: id.0 })
    }

    pub fn roots(&self) -> impl Iterator<Item = &TreeRoot> {
        self.roots.iter()
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    pub(crate) fn set_top_statement(&mut self, root: RootId, top: NodeId) -> Result<()> {
        self.root_mut(root)?.top = Some(top);
        Ok(())
    }

    /// Record that `submodule` belongs to the module tree `owner`
    pub fn link_submodule(&mut self, owner: RootId, submodule: RootId) -> Result<()> {
        if owner == submodule {
            return Err(YangError::invalid_mutation(
                "a tree root cannot own itself as submodule",
            ));
        }
        self.root(owner)?;
        let previous = self.root_mut(submodule)?.owner.replace(owner);
        if let Some(previous) = previous
            && previous != owner
        {
            self.root_mut(previous)?
                .owned_submodules
                .retain(|s| *s != submodule);
        }
        let owner_root = self.root_mut(owner)?;
        if !owner_root.owned_submodules.contains(&submodule) {
            owner_root.owned_submodules.push(submodule);
        }
        Ok(())
    }

    /// The root whose module "owns" `root`: the root itself for modules, the
    /// owning module's root for linked submodules, `None` for orphans
    pub fn owning_root(&self, root: RootId) -> Result<Option<RootId>> {
        let tree = self.root(root)?;
        let Some(top) = tree.top else {
            return Ok(None);
        };
        if self.node(top)?.is(CoreKind::Submodule) {
            Ok(tree.owner)
        } else {
            Ok(Some(root))
        }
    }

    /// Namespace of a tree: the module's `namespace` argument, delegated to
    /// the owning module for submodules. `None` for orphaned submodules.
    pub fn namespace_of_root(&self, root: RootId) -> Result<Option<String>> {
        let Some(owner) = self.owning_root(root)? else {
            return Ok(None);
        };
        let Some(top) = self.root(owner)?.top else {
            return Ok(None);
        };
        Ok(self
            .first_child_of_kind(top, CoreKind::Namespace)?
            .and_then(|ns| self.get(ns))
            .map(|ns| ns.trimmed_argument().to_string()))
    }

    // ---- node access ----

    pub(crate) fn alloc(&mut self, node: StatementNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&StatementNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> Result<&StatementNode> {
        self.get(id).ok_or(YangError::NodeNotFound { id: id.0 })
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut StatementNode> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(YangError::NodeNotFound { id: id.0 })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn children_of(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(self.node(id)?.children())
    }

    /// Children whose key equals `key`, in order
    pub fn children_with_key(&self, id: NodeId, key: &StatementKey) -> Result<Vec<NodeId>> {
        Ok(self
            .node(id)?
            .children
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_some_and(|n| &n.key == key))
            .collect())
    }

    /// Core-statement children of one kind, in order
    pub fn children_of_kind(&self, id: NodeId, kind: CoreKind) -> Result<Vec<NodeId>> {
        Ok(self
            .node(id)?
            .children
            .iter()
            .copied()
            .filter(|c| self.get(*c).is_some_and(|n| n.is(kind)))
            .collect())
    }

    pub fn first_child_of_kind(&self, id: NodeId, kind: CoreKind) -> Result<Option<NodeId>> {
        Ok(self
            .node(id)?
            .children
            .iter()
            .copied()
            .find(|c| self.get(*c).is_some_and(|n| n.is(kind))))
    }

    /// `id` and all nodes below it, parents before children
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(out)
    }

    /// Whether `ancestor` is `node` or lies on its parent chain
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(|n| n.parent);
        }
        false
    }

    fn is_top_statement(&self, id: NodeId) -> bool {
        self.roots.iter().any(|r| r.top == Some(id))
    }

    pub(crate) fn attach_finding(&mut self, finding: &Finding) {
        if let Some(id) = finding.target.node()
            && let Some(Some(node)) = self.nodes.get_mut(id.index())
        {
            node.add_finding(finding.clone());
        }
    }

    // ---- mutation primitives ----

    /// Insert `child` under `parent` at `at_index` (appended when `None` or
    /// past the end). A child that already has a parent is unlinked there
    /// first. `parent` and `root` of the moved subtree are updated.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId, at_index: Option<usize>) -> Result<()> {
        self.check_can_add(parent, child)?;

        if let Some(old_parent) = self.node(child)?.parent {
            self.remove_child(old_parent, child)?;
        }

        let new_root = self.node(parent)?.root;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = at_index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(index, child);

        self.node_mut(child)?.parent = Some(parent);
        self.set_root_of_subtree(child, new_root)?;
        trace!("Added {} under {} at index {}", child, parent, index);
        Ok(())
    }

    /// Fails when `child` cannot be placed under `parent`; nothing is changed
    fn check_can_add(&self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(YangError::invalid_mutation(format!(
                "cannot add {child} under its own descendant {parent}"
            )));
        }
        if self.is_top_statement(child) {
            return Err(YangError::invalid_mutation(format!(
                "{child} is the top statement of a tree and cannot be re-parented"
            )));
        }
        Ok(())
    }

    /// Append `child` as last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.add_child(parent, child, None)
    }

    /// Unlink `child` from `parent` and return the index it occupied
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<usize> {
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| {
                YangError::invalid_mutation(format!("{child} is not a child of {parent}"))
            })?;
        siblings.remove(index);
        self.node_mut(child)?.parent = None;
        trace!("Removed {} from {} (index {})", child, parent, index);
        Ok(index)
    }

    /// Swap `old` for `new` at the position `old` occupied
    ///
    /// On error the tree is left untouched.
    pub fn replace_child_in_place(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> Result<()> {
        if old == new {
            return Ok(());
        }
        self.check_can_add(parent, new)?;
        let mut index = self.remove_child(parent, old)?;

        // `new` may be an earlier sibling; its own removal shifts the gap left
        if self.node(new)?.parent == Some(parent)
            && let Some(pos) = self.node(parent)?.children.iter().position(|c| *c == new)
            && pos < index
        {
            index -= 1;
        }
        self.add_child(parent, new, Some(index))
    }

    /// Remove every child with `key` and append `new_children`
    ///
    /// Returns the removed children, now detached.
    pub fn replace_children_with(
        &mut self,
        parent: NodeId,
        key: &StatementKey,
        new_children: Vec<NodeId>,
    ) -> Result<Vec<NodeId>> {
        for child in &new_children {
            self.check_can_add(parent, *child)?;
        }
        let removed = self.children_with_key(parent, key)?;
        for child in &removed {
            self.remove_child(parent, *child)?;
        }
        for child in new_children {
            self.append_child(parent, child)?;
        }
        Ok(removed)
    }

    /// Deep-copy `source` and its subtree, appending the copy under
    /// `new_parent`
    ///
    /// The copy views the same document elements, keeps the same variants,
    /// effective attributes and custom data. It starts without findings.
    pub fn clone_subtree(&mut self, source: NodeId, new_parent: NodeId) -> Result<NodeId> {
        let root = self.node(new_parent)?.root;
        let copy = self.clone_node(source, new_parent, root)?;
        self.node_mut(new_parent)?.children.push(copy);
        trace!("Cloned {} as {} under {}", source, copy, new_parent);
        Ok(copy)
    }

    fn clone_node(&mut self, source: NodeId, parent: NodeId, root: RootId) -> Result<NodeId> {
        let original = self.node(source)?;
        let mut copy = StatementNode::new(
            original.key.clone(),
            original.variant.clone(),
            original.element.clone(),
            Some(parent),
            root,
        );
        copy.effective_namespace = original.effective_namespace.clone();
        copy.effective_status = original.effective_status;
        copy.effective_conformance = original.effective_conformance;
        copy.effective_config = original.effective_config;
        copy.custom_data = original.custom_data.clone();
        copy.document_order = original.document_order;
        let children = original.children.clone();

        let id = self.alloc(copy);
        for child in children {
            let child_copy = self.clone_node(child, id, root)?;
            self.node_mut(id)?.children.push(child_copy);
        }
        Ok(id)
    }

    /// Free a detached subtree
    pub fn discard(&mut self, id: NodeId) -> Result<()> {
        if self.node(id)?.parent.is_some() || self.is_top_statement(id) {
            return Err(YangError::invalid_mutation(format!(
                "{id} is still part of a tree"
            )));
        }
        for node in self.descendants(id)? {
            self.nodes[node.index()] = None;
        }
        Ok(())
    }

    fn set_root_of_subtree(&mut self, id: NodeId, root: RootId) -> Result<()> {
        if self.node(id)?.root == root {
            return Ok(());
        }
        for node in self.descendants(id)? {
            self.node_mut(node)?.root = root;
        }
        Ok(())
    }

    // ---- merging ----

    /// Move every node and root of `other` into this arena
    ///
    /// Returns the offsets added to the node and root ids of `other`.
    pub(crate) fn absorb(&mut self, other: StatementArena) -> (u32, u32) {
        let node_offset = self.nodes.len() as u32;
        let root_offset = self.roots.len() as u32;

        for slot in other.nodes {
            self.nodes.push(slot.map(|mut node| {
                node.parent = node.parent.map(|p| p.shifted(node_offset));
                node.root = node.root.shifted(root_offset);
                for child in &mut node.children {
                    *child = child.shifted(node_offset);
                }
                node.findings = node
                    .findings
                    .into_iter()
                    .map(|mut f| {
                        f.shift_nodes(node_offset);
                        f
                    })
                    .collect();
                node
            }));
        }
        for mut root in other.roots {
            root.id = root.id.shifted(root_offset);
            root.top = root.top.map(|t| t.shifted(node_offset));
            root.owner = root.owner.map(|o| o.shifted(root_offset));
            for sub in &mut root.owned_submodules {
                *sub = sub.shifted(root_offset);
            }
            self.roots.push(root);
        }
        (node_offset, root_offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomElement, ModulePrefixResolver, PrefixResolver};
    use crate::statement::node::{CustomValue, StatementVariant};
    use std::sync::Arc;

    fn resolver(module: &str) -> Arc<dyn PrefixResolver> {
        Arc::new(ModulePrefixResolver::new(module))
    }

    fn make(arena: &mut StatementArena, kind: CoreKind, arg: &str, parent: Option<NodeId>, root: RootId) -> NodeId {
        let element = Arc::new(DomElement::new(kind.keyword(), Some(arg), resolver("m")));
        let id = arena.alloc(StatementNode::new(
            StatementKey::core(kind.keyword()),
            StatementVariant::Core(kind),
            element,
            parent,
            root,
        ));
        if let Some(p) = parent {
            arena.node_mut(p).unwrap().children.push(id);
        }
        id
    }

    fn fixture() -> (StatementArena, RootId, NodeId, NodeId, NodeId) {
        let mut arena = StatementArena::new();
        let root = arena.add_root(None, ConformanceType::Implement);
        let module = make(&mut arena, CoreKind::Module, "m", None, root);
        arena.set_top_statement(root, module).unwrap();
        let a = make(&mut arena, CoreKind::Container, "a", Some(module), root);
        let b = make(&mut arena, CoreKind::Container, "b", Some(module), root);
        (arena, root, module, a, b)
    }

    #[test]
    fn test_reparenting_keeps_single_owner() {
        let (mut arena, _, _, a, b) = fixture();
        let root = arena.node(a).unwrap().root();
        let x = make(&mut arena, CoreKind::Leaf, "x", None, root);

        arena.add_child(a, x, None).unwrap();
        arena.add_child(b, x, None).unwrap();

        assert!(!arena.children_of(a).unwrap().contains(&x));
        assert_eq!(arena.children_of(b).unwrap().iter().filter(|c| **c == x).count(), 1);
        assert_eq!(arena.node(x).unwrap().parent(), Some(b));
    }

    #[test]
    fn test_remove_returns_index() {
        let (mut arena, _, module, _, b) = fixture();
        assert_eq!(arena.remove_child(module, b).unwrap(), 1);
        assert_eq!(arena.node(b).unwrap().parent(), None);
        assert!(arena.remove_child(module, b).is_err());
    }

    #[test]
    fn test_replace_in_place_preserves_position() {
        let (mut arena, root, module, a, b) = fixture();
        let c = make(&mut arena, CoreKind::Container, "c", Some(module), root);
        let replacement = make(&mut arena, CoreKind::List, "r", None, root);

        arena.replace_child_in_place(module, b, replacement).unwrap();
        assert_eq!(arena.children_of(module).unwrap(), &[a, replacement, c]);
        assert_eq!(arena.node(b).unwrap().parent(), None);
    }

    #[test]
    fn test_replace_in_place_with_earlier_sibling() {
        let (mut arena, root, module, a, b) = fixture();
        let c = make(&mut arena, CoreKind::Container, "c", Some(module), root);

        arena.replace_child_in_place(module, b, a).unwrap();
        assert_eq!(arena.children_of(module).unwrap(), &[a, c]);
    }

    #[test]
    fn test_replace_children_with_key() {
        let (mut arena, root, module, a, b) = fixture();
        let leaf = make(&mut arena, CoreKind::Leaf, "l", Some(module), root);
        let new_container = make(&mut arena, CoreKind::Container, "n", None, root);

        let removed = arena
            .replace_children_with(module, &StatementKey::core("container"), vec![new_container])
            .unwrap();
        assert_eq!(removed, vec![a, b]);
        assert_eq!(arena.children_of(module).unwrap(), &[leaf, new_container]);
    }

    #[test]
    fn test_cannot_create_cycles() {
        let (mut arena, _, _, a, _) = fixture();
        let root = arena.node(a).unwrap().root();
        let inner = make(&mut arena, CoreKind::Leaf, "i", Some(a), root);
        assert!(arena.add_child(inner, a, None).is_err());
        assert!(arena.add_child(a, a, None).is_err());
    }

    #[test]
    fn test_failed_replace_leaves_tree_untouched() {
        let (mut arena, root, module, a, b) = fixture();
        let leaf = make(&mut arena, CoreKind::Leaf, "l", Some(a), root);

        assert!(arena.replace_child_in_place(a, leaf, a).is_err());
        assert_eq!(arena.children_of(a).unwrap(), &[leaf]);
        assert_eq!(arena.node(leaf).unwrap().parent(), Some(a));

        assert!(arena.replace_child_in_place(a, leaf, module).is_err());
        assert_eq!(arena.children_of(a).unwrap(), &[leaf]);

        let err = arena
            .replace_children_with(module, &StatementKey::core("container"), vec![module])
            .unwrap_err();
        assert!(matches!(err, YangError::InvalidMutation { .. }));
        assert_eq!(arena.children_of(module).unwrap(), &[a, b]);
        assert_eq!(arena.node(b).unwrap().parent(), Some(module));
    }

    #[test]
    fn test_clone_copies_attributes_but_not_findings() {
        let (mut arena, root, module, a, b) = fixture();
        let leaf = make(&mut arena, CoreKind::Leaf, "l", Some(a), root);
        {
            let node = arena.node_mut(a).unwrap();
            node.effective_config = false;
            node.set_custom_data("tags", CustomValue::List(vec![CustomValue::Int(1)]));
            node.add_finding(Finding::general(crate::diagnostics::FindingKind::Unspecified, "x"));
        }

        let copy = arena.clone_subtree(a, b).unwrap();
        let cloned = arena.node(copy).unwrap();
        assert_eq!(cloned.parent(), Some(b));
        assert!(!cloned.effective_config());
        assert!(!cloned.has_findings());
        assert_eq!(cloned.custom_data("tags").unwrap().as_list().unwrap().len(), 1);
        assert!(Arc::ptr_eq(cloned.element(), arena.node(a).unwrap().element()));

        let copied_children = arena.children_of(copy).unwrap().to_vec();
        assert_eq!(copied_children.len(), 1);
        assert_ne!(copied_children[0], leaf);
        assert_eq!(arena.node(copied_children[0]).unwrap().parent(), Some(copy));
        assert_eq!(arena.children_of(module).unwrap().len(), 2);
    }

    #[test]
    fn test_discard_requires_detached_subtree() {
        let (mut arena, _, module, a, _) = fixture();
        assert!(arena.discard(a).is_err());
        arena.remove_child(module, a).unwrap();
        arena.discard(a).unwrap();
        assert!(!arena.contains(a));
        assert!(matches!(arena.node(a), Err(YangError::NodeNotFound { .. })));
    }

    #[test]
    fn test_moving_between_roots_updates_root() {
        let (mut arena, _, _, a, _) = fixture();
        let other_root = arena.add_root(None, ConformanceType::Import);
        let other_module = make(&mut arena, CoreKind::Module, "n", None, other_root);
        arena.set_top_statement(other_root, other_module).unwrap();
        let a_root = arena.node(a).unwrap().root();
        let inner = make(&mut arena, CoreKind::Leaf, "i", Some(a), a_root);

        arena.add_child(other_module, a, None).unwrap();
        assert_eq!(arena.node(a).unwrap().root(), other_root);
        assert_eq!(arena.node(inner).unwrap().root(), other_root);
    }
}
