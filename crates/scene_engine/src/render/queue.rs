//! Render queue
//!
//! Collects the geometries that survived culling, split by bucket and sorted
//! for drawing. Opaque geometry is drawn front to back so early depth
//! rejection kicks in; blended buckets are drawn back to front.

use std::cmp::Ordering;

use crate::scene::{Bucket, SpatialId};

/// A visible geometry and its distance to the camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedGeometry {
    /// Geometry to draw
    pub id: SpatialId,
    /// Distance from the camera to the world bound center
    pub distance: f32,
}

/// Per-frame list of geometries to draw, grouped by bucket
#[derive(Debug, Default)]
pub struct RenderQueue {
    opaque: Vec<QueuedGeometry>,
    transparent: Vec<QueuedGeometry>,
    translucent: Vec<QueuedGeometry>,
    sky: Vec<QueuedGeometry>,
    gui: Vec<QueuedGeometry>,
}

impl RenderQueue {
    /// Create an empty render queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a geometry. `Inherit` lands in the opaque bucket.
    pub fn add(&mut self, bucket: Bucket, id: SpatialId, distance: f32) {
        let entry = QueuedGeometry { id, distance };
        match bucket {
            Bucket::Inherit | Bucket::Opaque => self.opaque.push(entry),
            Bucket::Transparent => self.transparent.push(entry),
            Bucket::Translucent => self.translucent.push(entry),
            Bucket::Sky => self.sky.push(entry),
            Bucket::Gui => self.gui.push(entry),
        }
    }

    /// Sort buckets for drawing. Sky and GUI keep traversal order.
    pub fn sort(&mut self) {
        self.opaque.sort_by(front_to_back);
        self.transparent.sort_by(|a, b| front_to_back(b, a));
        self.translucent.sort_by(|a, b| front_to_back(b, a));
    }

    /// Entries of one bucket in draw order (after [`RenderQueue::sort`])
    pub fn bucket(&self, bucket: Bucket) -> &[QueuedGeometry] {
        match bucket {
            Bucket::Inherit | Bucket::Opaque => &self.opaque,
            Bucket::Transparent => &self.transparent,
            Bucket::Translucent => &self.translucent,
            Bucket::Sky => &self.sky,
            Bucket::Gui => &self.gui,
        }
    }

    /// Iterate all entries in draw order: opaque, sky, transparent,
    /// translucent, gui
    pub fn iter(&self) -> impl Iterator<Item = &QueuedGeometry> {
        self.opaque
            .iter()
            .chain(&self.sky)
            .chain(&self.transparent)
            .chain(&self.translucent)
            .chain(&self.gui)
    }

    /// Whether `id` was queued in any bucket
    pub fn contains(&self, id: SpatialId) -> bool {
        self.iter().any(|entry| entry.id == id)
    }

    /// Get total number of queued geometries
    pub fn total_count(&self) -> usize {
        self.opaque.len() + self.transparent.len() + self.translucent.len() + self.sky.len() + self.gui.len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Empty every bucket, keeping allocations for the next frame
    pub fn clear(&mut self) {
        self.opaque.clear();
        self.transparent.clear();
        self.translucent.clear();
        self.sky.clear();
        self.gui.clear();
    }
}

fn front_to_back(a: &QueuedGeometry, b: &QueuedGeometry) -> Ordering {
    a.distance.total_cmp(&b.distance)
}
