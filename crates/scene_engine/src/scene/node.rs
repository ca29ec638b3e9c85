//! Node operations: hierarchy edits and traversal
//!
//! A node exclusively owns its ordered children. Attaching marks the child's
//! subtree stale (it now composes with a new parent) and the new ancestors'
//! bounds; detaching leaves the child as an independent root.

use std::collections::VecDeque;

use log::{debug, error};

use super::error::{SceneError, SceneResult};
use super::spatial::{BatchState, NodeData, Spatial, SpatialId, SpatialKind};
use super::SceneGraph;

/// Visit order for [`SceneGraph::depth_first_traversal`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DfsMode {
    /// Parent before children
    #[default]
    PreOrder,
    /// Children before parent
    PostOrder,
}

/// Callback for graph traversals
pub trait SceneGraphVisitor {
    /// Called once per visited spatial
    fn visit(&mut self, id: SpatialId, spatial: &Spatial);
}

impl<F: FnMut(SpatialId, &Spatial)> SceneGraphVisitor for F {
    fn visit(&mut self, id: SpatialId, spatial: &Spatial) {
        self(id, spatial);
    }
}

impl SceneGraph {
    /// Create a detached node
    pub fn create_node(&mut self, name: impl Into<String>) -> SpatialId {
        let id = self.insert(Spatial::new(name, SpatialKind::Node(NodeData::default())));
        debug!("Created node '{}'", self.name_of(id));
        id
    }

    /// Children of a node in order; empty for geometries
    pub fn children(&self, id: SpatialId) -> SceneResult<&[SpatialId]> {
        Ok(self.spatial(id)?.children())
    }

    /// Attach `child` as the last child of `parent`
    pub fn attach_child(&mut self, parent: SpatialId, child: SpatialId) -> SceneResult<()> {
        let index = self.spatial(parent)?.children().len();
        self.attach_child_at(parent, child, index)
    }

    /// Attach `child` at `index` in `parent`'s child list.
    ///
    /// Attaching to the current parent is a no-op. A child attached elsewhere
    /// must be detached first (or moved with [`SceneGraph::reparent`]).
    pub fn attach_child_at(
        &mut self,
        parent: SpatialId,
        child: SpatialId,
        index: usize,
    ) -> SceneResult<()> {
        self.check_attach(parent, child)?;
        let current_parent = self.spatial(child)?.parent;
        match current_parent {
            Some(existing) if existing == parent => return Ok(()),
            Some(existing) => {
                error!(
                    "Cannot attach '{}' to '{}': already attached",
                    self.name_of(child),
                    self.name_of(parent)
                );
                return Err(SceneError::AlreadyHasParent {
                    child: self.name_of(child),
                    parent: self.name_of(existing),
                });
            }
            None => {}
        }

        let parent_name = self.name_of(parent);
        let children = self
            .spatial_mut(parent)?
            .children_mut()
            .ok_or_else(|| SceneError::NotANode(parent_name.clone()))?;
        if index > children.len() {
            return Err(SceneError::InvalidArgument(format!(
                "child index {index} out of range for '{parent_name}' with {} children",
                children.len()
            )));
        }
        children.insert(index, child);
        self.spatial_mut(child)?.parent = Some(parent);

        self.set_all_refresh(child);
        debug!("Attached '{}' to '{}'", self.name_of(child), parent_name);
        Ok(())
    }

    /// Parent must be a node and must not sit inside `child`'s subtree
    fn check_attach(&self, parent: SpatialId, child: SpatialId) -> SceneResult<()> {
        let parent_spatial = self.spatial(parent)?;
        self.spatial(child)?;
        if !parent_spatial.is_node() {
            return Err(SceneError::NotANode(parent_spatial.name.clone()));
        }
        if parent == child || self.is_ancestor(child, parent)? {
            error!(
                "Refusing to attach '{}' below its own descendant '{}'",
                self.name_of(child),
                parent_spatial.name
            );
            return Err(SceneError::CycleDetected {
                child: self.name_of(child),
                parent: parent_spatial.name.clone(),
            });
        }
        Ok(())
    }

    /// Detach `child` from `parent`. Returns `false` when it is not a child.
    pub fn detach_child(&mut self, parent: SpatialId, child: SpatialId) -> SceneResult<bool> {
        match self.child_index(parent, child)? {
            Some(index) => {
                self.detach_child_at(parent, index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Detach the child at `index`, returning it
    pub fn detach_child_at(&mut self, parent: SpatialId, index: usize) -> SceneResult<SpatialId> {
        let child = self
            .spatial(parent)?
            .children()
            .get(index)
            .copied()
            .ok_or_else(|| {
                SceneError::InvalidArgument(format!(
                    "child index {index} out of range for '{}'",
                    self.name_of(parent)
                ))
            })?;
        self.check_subtree_leaves_batches_intact(child)?;

        if let Some(children) = self.spatial_mut(parent)?.children_mut() {
            children.remove(index);
        }
        self.spatial_mut(child)?.parent = None;

        self.set_bound_refresh(parent);
        self.set_all_refresh(child);
        debug!("Detached '{}' from '{}'", self.name_of(child), self.name_of(parent));
        Ok(child)
    }

    /// Detach every child, returning them in their former order
    pub fn detach_all_children(&mut self, parent: SpatialId) -> SceneResult<Vec<SpatialId>> {
        let children = self.spatial(parent)?.children().to_vec();
        for child in &children {
            self.check_subtree_leaves_batches_intact(*child)?;
        }
        for index in (0..children.len()).rev() {
            self.detach_child_at(parent, index)?;
        }
        Ok(children)
    }

    /// Detach `child` from its current parent, if any, and attach it to
    /// `new_parent`
    pub fn reparent(&mut self, child: SpatialId, new_parent: SpatialId) -> SceneResult<()> {
        self.check_attach(new_parent, child)?;
        match self.spatial(child)?.parent {
            Some(old) if old == new_parent => return Ok(()),
            Some(old) => {
                self.detach_child(old, child)?;
            }
            None => {}
        }
        self.attach_child(new_parent, child)
    }

    /// Position of `child` in `parent`'s child list
    pub fn child_index(&self, parent: SpatialId, child: SpatialId) -> SceneResult<Option<usize>> {
        Ok(self
            .spatial(parent)?
            .children()
            .iter()
            .position(|c| *c == child))
    }

    /// First descendant named `name`, searched depth first in child order
    pub fn child_by_name(&self, id: SpatialId, name: &str) -> SceneResult<Option<SpatialId>> {
        let mut stack: Vec<SpatialId> = self.spatial(id)?.children().iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            let spatial = self.spatial(current)?;
            if spatial.name == name {
                return Ok(Some(current));
            }
            stack.extend(spatial.children().iter().rev());
        }
        Ok(None)
    }

    /// Whether `descendant` lies anywhere below `id`
    pub fn has_child(&self, id: SpatialId, descendant: SpatialId) -> SceneResult<bool> {
        self.spatial(id)?;
        self.is_ancestor(id, descendant)
    }

    /// Swap two children by index
    pub fn swap_child_positions(
        &mut self,
        parent: SpatialId,
        a: usize,
        b: usize,
    ) -> SceneResult<()> {
        let name = self.name_of(parent);
        let children = self
            .spatial_mut(parent)?
            .children_mut()
            .ok_or(SceneError::NotANode(name))?;
        if a >= children.len() || b >= children.len() {
            return Err(SceneError::InvalidArgument(format!(
                "cannot swap children {a} and {b} of {} children",
                children.len()
            )));
        }
        children.swap(a, b);
        Ok(())
    }

    /// Destroy a spatial together with its subtree
    pub fn remove(&mut self, id: SpatialId) -> SceneResult<()> {
        self.check_subtree_leaves_batches_intact(id)?;
        if let Some(parent) = self.spatial(id)?.parent {
            self.detach_child(parent, id)?;
        }

        let name = self.name_of(id);
        let mut removed = 0;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(spatial) = self.spatials.remove(current) {
                stack.extend(spatial.children());
                self.batches.remove(current);
                removed += 1;
            }
        }
        self.pending_batch_sync.retain(|member, _| self.spatials.contains_key(member));
        debug!("Removed '{name}' and {} descendants", removed - 1);
        Ok(())
    }

    /// Whether `ancestor` is a strict ancestor of `id`
    pub(crate) fn is_ancestor(&self, ancestor: SpatialId, id: SpatialId) -> SceneResult<bool> {
        let mut cursor = self.spatial(id)?.parent;
        while let Some(current) = cursor {
            if current == ancestor {
                return Ok(true);
            }
            cursor = self.spatial(current)?.parent;
        }
        Ok(false)
    }

    /// A subtree may only leave its parent when every batch it takes part in
    /// is owned inside the subtree
    fn check_subtree_leaves_batches_intact(&self, root: SpatialId) -> SceneResult<()> {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let spatial = self.spatial(current)?;
            let owner = match spatial.batch_state() {
                BatchState::Member { owner, .. } | BatchState::Generated { owner } => Some(owner),
                BatchState::None => None,
            };
            if let Some(owner) = owner {
                if owner != root && !self.is_ancestor(root, owner)? {
                    error!("'{}' is still batched by '{}'", spatial.name, self.name_of(owner));
                    return Err(SceneError::BatchedGeometry(spatial.name.clone()));
                }
            }
            stack.extend(spatial.children());
        }
        Ok(())
    }

    /// Visit `id` and its subtree depth first
    pub fn depth_first_traversal<V: SceneGraphVisitor + ?Sized>(
        &self,
        id: SpatialId,
        mode: DfsMode,
        visitor: &mut V,
    ) -> SceneResult<()> {
        self.spatial(id)?;
        match mode {
            DfsMode::PreOrder => {
                let mut stack = vec![id];
                while let Some(current) = stack.pop() {
                    let spatial = self.spatial(current)?;
                    visitor.visit(current, spatial);
                    stack.extend(spatial.children().iter().rev());
                }
            }
            DfsMode::PostOrder => {
                let mut stack = vec![(id, false)];
                while let Some((current, children_done)) = stack.pop() {
                    let spatial = self.spatial(current)?;
                    if children_done {
                        visitor.visit(current, spatial);
                        continue;
                    }
                    stack.push((current, true));
                    stack.extend(spatial.children().iter().rev().map(|child| (*child, false)));
                }
            }
        }
        Ok(())
    }

    /// Visit `id` and its subtree level by level
    pub fn breadth_first_traversal<V: SceneGraphVisitor + ?Sized>(
        &self,
        id: SpatialId,
        visitor: &mut V,
    ) -> SceneResult<()> {
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            let spatial = self.spatial(current)?;
            visitor.visit(current, spatial);
            queue.extend(spatial.children());
        }
        Ok(())
    }
}
