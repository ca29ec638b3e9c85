//! Behavior controls attached to spatials
//!
//! Controls run once per logical update with the frame time and once per
//! render pass for every visible spatial, in the order they were added. An
//! update callback gets the whole graph and may change anything, including
//! its own spatial; those changes are picked up by the same frame's
//! [`SceneGraph::update_geometric_state`].

use std::mem;

use log::debug;

use super::error::SceneResult;
use super::spatial::SpatialId;
use super::SceneGraph;
use crate::render::ViewPort;

/// Behavior attached to a spatial
pub trait Control: Send {
    /// Logical update with the time per frame in seconds
    fn update(&mut self, graph: &mut SceneGraph, spatial: SpatialId, tpf: f32) -> SceneResult<()>;

    /// Called when the spatial was found visible in `viewport`
    fn render(&mut self, _graph: &SceneGraph, _spatial: SpatialId, _viewport: &ViewPort) {}

    /// Disabled controls are skipped by both callbacks
    fn is_enabled(&self) -> bool {
        true
    }

    /// Copy of this control for a cloned spatial; `None` means the clone
    /// goes without it
    fn clone_for_spatial(&self) -> Option<Box<dyn Control>> {
        None
    }
}

impl SceneGraph {
    /// Append a control to a spatial
    pub fn add_control(&mut self, id: SpatialId, control: Box<dyn Control>) -> SceneResult<()> {
        self.spatial_mut(id)?.controls.push(control);
        Ok(())
    }

    /// Remove and return every control of a spatial
    pub fn remove_controls(&mut self, id: SpatialId) -> SceneResult<Vec<Box<dyn Control>>> {
        Ok(mem::take(&mut self.spatial_mut(id)?.controls))
    }

    /// Number of controls attached to a spatial
    pub fn control_count(&self, id: SpatialId) -> SceneResult<usize> {
        Ok(self.spatial(id)?.controls.len())
    }

    /// Run every enabled control under `root`, parents before children.
    /// Children are read after their parent's controls ran, so spatials a
    /// control attaches are updated in the same pass.
    pub fn update_logical_state(&mut self, root: SpatialId, tpf: f32) -> SceneResult<()> {
        self.spatial(root)?;
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                // Removed by an earlier control
                continue;
            }
            self.run_update_controls(current, tpf)?;
            if let Some(spatial) = self.spatials.get(current) {
                stack.extend(spatial.children().iter().rev());
            }
        }
        Ok(())
    }

    fn run_update_controls(&mut self, id: SpatialId, tpf: f32) -> SceneResult<()> {
        let mut controls = mem::take(&mut self.spatial_mut(id)?.controls);
        if controls.is_empty() {
            return Ok(());
        }

        let mut result = Ok(());
        for control in controls.iter_mut().filter(|control| control.is_enabled()) {
            result = control.update(self, id, tpf);
            if result.is_err() {
                break;
            }
        }

        match self.spatials.get_mut(id) {
            Some(spatial) => {
                let added = mem::replace(&mut spatial.controls, controls);
                spatial.controls.extend(added);
            }
            None => debug!("Spatial removed by its own control, dropping {} controls", controls.len()),
        }
        result
    }

    pub(crate) fn run_render_controls(&mut self, id: SpatialId, viewport: &ViewPort) -> SceneResult<()> {
        let mut controls = mem::take(&mut self.spatial_mut(id)?.controls);
        for control in controls.iter_mut().filter(|control| control.is_enabled()) {
            control.render(self, id, viewport);
        }
        self.spatial_mut(id)?.controls = controls;
        Ok(())
    }
}
