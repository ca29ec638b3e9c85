//! Hierarchical frustum culling and render queue collection
//!
//! Each spatial caches the result of its last culling check. A child of a
//! spatial that was fully inside or fully outside inherits that result
//! without testing its own bound, so only spatials straddling the frustum
//! boundary cost a bound test.

use log::error;

use super::error::{SceneError, SceneResult};
use super::hints::{Bucket, CullHint};
use super::spatial::{BatchState, SpatialId};
use super::SceneGraph;
use crate::render::{Culler, FrustumIntersect, RenderQueue, ViewPort};

impl SceneGraph {
    /// Decide whether a spatial is visible to `culler`, caching the frustum
    /// status for its children. Parents must be checked before children
    /// within a frame.
    ///
    /// Fails with [`SceneError::SceneNotUpdated`] when any refresh flag is
    /// pending: culling against stale bounds is a caller error.
    pub fn check_culling(&mut self, id: SpatialId, culler: &dyn Culler) -> SceneResult<bool> {
        let spatial = self.spatial(id)?;
        if !spatial.refresh.is_empty() {
            error!(
                "Scene graph is not properly updated for rendering: '{}' has {:?} pending",
                spatial.name, spatial.refresh
            );
            return Err(SceneError::SceneNotUpdated {
                name: spatial.name.clone(),
                flags: spatial.refresh,
            });
        }

        let (status, visible) = match self.effective_cull_hint(id)? {
            CullHint::Always => (FrustumIntersect::Outside, false),
            CullHint::Never => (FrustumIntersect::Intersects, true),
            CullHint::Dynamic | CullHint::Inherit => {
                let inherited = match spatial.parent {
                    Some(parent) => self.spatial(parent)?.frustum_intersects,
                    None => FrustumIntersect::Intersects,
                };
                if inherited != FrustumIntersect::Intersects {
                    (inherited, inherited != FrustumIntersect::Outside)
                } else if self.effective_queue_bucket(id)? == Bucket::Gui {
                    // Screen space: tested against the viewport, status unchanged
                    let visible = spatial.world_bound.map_or(true, |bound| culler.contains_gui(&bound));
                    (inherited, visible)
                } else {
                    let status = spatial
                        .world_bound
                        .map_or(FrustumIntersect::Inside, |bound| culler.contains(&bound));
                    (status, status != FrustumIntersect::Outside)
                }
            }
        };

        self.spatial_mut(id)?.frustum_intersects = status;
        Ok(visible)
    }

    /// Walk the tree under `root`, culling hierarchically against the
    /// viewport camera. Visible spatials get their controls' render callback;
    /// visible geometry that is not merged into a batch is queued by bucket
    /// with its distance to the camera. The queue is sorted on return.
    pub fn collect_visible(
        &mut self,
        root: SpatialId,
        viewport: &ViewPort,
        queue: &mut RenderQueue,
    ) -> SceneResult<()> {
        let camera_location = viewport.camera.location();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if !self.check_culling(current, &viewport.camera)? {
                continue;
            }
            self.run_render_controls(current, viewport)?;

            let spatial = self.spatial(current)?;
            if spatial.is_geometry() && !matches!(spatial.batch_state(), BatchState::Member { .. }) {
                let center = spatial
                    .world_bound
                    .map_or(spatial.world_transform.translation, |bound| bound.center());
                let bucket = self.effective_queue_bucket(current)?;
                queue.add(bucket, current, (center - camera_location).norm());
            }
            stack.extend(spatial.children().iter().rev());
        }
        queue.sort();
        Ok(())
    }
}
