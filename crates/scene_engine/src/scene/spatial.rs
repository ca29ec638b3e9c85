//! Spatial: the entity stored in the scene graph arena
//!
//! A spatial is either a node (ordered children) or a geometry (mesh and
//! material). Local state is set through [`super::SceneGraph`] setters; the
//! world state cached here is only meaningful while the matching refresh flag
//! is clear, so it is read through the graph's resolving accessors instead.

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use super::control::Control;
use super::hints::{BatchHint, Bucket, CullHint, ShadowMode};
use crate::bounding::BoundingVolume;
use crate::foundation::math::{Mat4, Transform};
use crate::light::LightList;
use crate::render::{FrustumIntersect, Material, Mesh};

slotmap::new_key_type! {
    /// Handle to a spatial owned by a [`super::SceneGraph`]
    pub struct SpatialId;
}

bitflags! {
    /// Which cached world state is stale
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RefreshFlags: u8 {
        /// World transform (and geometry world matrix)
        const TRANSFORM = 1 << 0;
        /// World bound
        const BOUND = 1 << 1;
        /// World light list
        const LIGHT_LIST = 1 << 2;
    }
}

/// Batch membership of a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    /// Rendered on its own
    #[default]
    None,
    /// Merged into `batch`, which `owner` generated
    Member {
        /// Node that owns the batch
        owner: SpatialId,
        /// Generated geometry holding the merged mesh
        batch: SpatialId,
    },
    /// Generated by `owner` to hold merged meshes
    Generated {
        /// Node that owns the batch
        owner: SpatialId,
    },
}

/// Node payload
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub(crate) children: Vec<SpatialId>,
}

/// Geometry payload
#[derive(Debug, Clone)]
pub struct GeometryData {
    pub(crate) mesh: Arc<Mesh>,
    pub(crate) material: Arc<Material>,
    pub(crate) world_matrix: Mat4,
    pub(crate) ignore_transform: bool,
    pub(crate) batch: BatchState,
}

impl GeometryData {
    pub(crate) fn new(mesh: Arc<Mesh>, material: Arc<Material>) -> Self {
        Self {
            mesh,
            material,
            world_matrix: Mat4::identity(),
            ignore_transform: false,
            batch: BatchState::None,
        }
    }

    /// Shared mesh
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Shared material
    pub fn material(&self) -> &Arc<Material> {
        &self.material
    }

    /// Whether world transforms are ignored for bounds and the world matrix
    pub fn ignores_transform(&self) -> bool {
        self.ignore_transform
    }

    /// Batch membership
    pub fn batch_state(&self) -> BatchState {
        self.batch
    }
}

/// The two kinds of spatial
#[derive(Debug, Clone)]
pub enum SpatialKind {
    /// Composite with ordered children
    Node(NodeData),
    /// Renderable leaf
    Geometry(GeometryData),
}

/// Entity of the scene graph
pub struct Spatial {
    pub(crate) name: String,
    pub(crate) kind: SpatialKind,
    pub(crate) parent: Option<SpatialId>,

    pub(crate) local_transform: Transform,
    pub(crate) local_lights: LightList,
    pub(crate) cull_hint: CullHint,
    pub(crate) batch_hint: BatchHint,
    pub(crate) queue_bucket: Bucket,
    pub(crate) shadow_mode: ShadowMode,

    pub(crate) world_transform: Transform,
    pub(crate) world_bound: Option<BoundingVolume>,
    pub(crate) world_lights: LightList,
    pub(crate) frustum_intersects: FrustumIntersect,
    pub(crate) refresh: RefreshFlags,

    pub(crate) controls: Vec<Box<dyn Control>>,
}

impl Spatial {
    /// New spatial with identity transform and every refresh flag set
    pub(crate) fn new(name: impl Into<String>, kind: SpatialKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            local_transform: Transform::identity(),
            local_lights: LightList::new(),
            cull_hint: CullHint::Inherit,
            batch_hint: BatchHint::Inherit,
            queue_bucket: Bucket::Inherit,
            shadow_mode: ShadowMode::Inherit,
            world_transform: Transform::identity(),
            world_bound: None,
            world_lights: LightList::new(),
            frustum_intersects: FrustumIntersect::Intersects,
            refresh: RefreshFlags::all(),
            controls: Vec::new(),
        }
    }

    /// Display name, not unique
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node or geometry payload
    pub fn kind(&self) -> &SpatialKind {
        &self.kind
    }

    /// True for nodes
    pub fn is_node(&self) -> bool {
        matches!(self.kind, SpatialKind::Node(_))
    }

    /// True for geometries
    pub fn is_geometry(&self) -> bool {
        matches!(self.kind, SpatialKind::Geometry(_))
    }

    /// Geometry payload, if this is a geometry
    pub fn as_geometry(&self) -> Option<&GeometryData> {
        match &self.kind {
            SpatialKind::Geometry(geometry) => Some(geometry),
            SpatialKind::Node(_) => None,
        }
    }

    /// Parent, `None` at a root
    pub fn parent(&self) -> Option<SpatialId> {
        self.parent
    }

    /// Children in order; empty for geometries
    pub fn children(&self) -> &[SpatialId] {
        match &self.kind {
            SpatialKind::Node(node) => &node.children,
            SpatialKind::Geometry(_) => &[],
        }
    }

    /// Transform relative to the parent
    pub fn local_transform(&self) -> Transform {
        self.local_transform
    }

    /// Lights attached directly to this spatial
    pub fn local_lights(&self) -> &LightList {
        &self.local_lights
    }

    /// Cull hint as set, possibly `Inherit`
    pub fn cull_hint(&self) -> CullHint {
        self.cull_hint
    }

    /// Batch hint as set, possibly `Inherit`
    pub fn batch_hint(&self) -> BatchHint {
        self.batch_hint
    }

    /// Queue bucket as set, possibly `Inherit`
    pub fn queue_bucket(&self) -> Bucket {
        self.queue_bucket
    }

    /// Shadow mode as set, possibly `Inherit`
    pub fn shadow_mode(&self) -> ShadowMode {
        self.shadow_mode
    }

    /// Pending refresh flags
    pub fn refresh_flags(&self) -> RefreshFlags {
        self.refresh
    }

    /// Result of the most recent culling check
    pub fn last_frustum_intersection(&self) -> FrustumIntersect {
        self.frustum_intersects
    }

    /// Number of attached controls
    pub fn control_count(&self) -> usize {
        self.controls.len()
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<SpatialId>> {
        match &mut self.kind {
            SpatialKind::Node(node) => Some(&mut node.children),
            SpatialKind::Geometry(_) => None,
        }
    }

    pub(crate) fn geometry_mut(&mut self) -> Option<&mut GeometryData> {
        match &mut self.kind {
            SpatialKind::Geometry(geometry) => Some(geometry),
            SpatialKind::Node(_) => None,
        }
    }

    pub(crate) fn batch_state(&self) -> BatchState {
        self.as_geometry().map_or(BatchState::None, |g| g.batch)
    }
}

impl fmt::Debug for Spatial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spatial")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("local_transform", &self.local_transform)
            .field("refresh", &self.refresh)
            .field("controls", &self.controls.len())
            .finish_non_exhaustive()
    }
}
