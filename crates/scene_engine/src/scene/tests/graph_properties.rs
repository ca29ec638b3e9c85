//! Propagation, resolution and culling guarantees of the scene graph

use std::sync::Arc;

use approx::assert_relative_eq;

use super::CountingCuller;
use crate::bounding::{BoundingBox, BoundingVolume};
use crate::core::SceneConfig;
use crate::foundation::math::{Quat, Transform, Vec3};
use crate::light::Light;
use crate::render::{Camera, FrustumIntersect, Material, Mesh};
use crate::scene::{RefreshFlags, SceneError, SceneGraph, SpatialId};

fn material() -> Arc<Material> {
    Arc::new(Material::new("grey"))
}

/// `depth` nested nodes with a cube geometry at the bottom
fn chain(graph: &mut SceneGraph, depth: usize) -> (SpatialId, SpatialId) {
    let root = graph.create_node("n0");
    let mut parent = root;
    for i in 1..depth {
        let node = graph.create_node(format!("n{i}"));
        graph.attach_child(parent, node).unwrap();
        parent = node;
    }
    let leaf = graph.create_geometry("leaf", Mesh::cube(1.0), material());
    graph.attach_child(parent, leaf).unwrap();
    (root, leaf)
}

#[test]
fn test_repeated_moves_stop_at_first_dirty_ancestor() {
    let mut graph = SceneGraph::new();
    let depth = 8;
    let (root, leaf) = chain(&mut graph, depth);
    graph.update_geometric_state(root).unwrap();
    graph.reset_stats();

    let moves = 5;
    for _ in 0..moves {
        graph.move_local(leaf, Vec3::new(0.1, 0.0, 0.0)).unwrap();
    }

    // First move walks every ancestor, the rest stop at the parent
    assert_eq!(graph.stats().ancestor_visits, (depth + moves - 1) as u64);
}

#[test]
fn test_update_twice_is_idempotent() {
    let mut graph = SceneGraph::new();
    let (root, leaf) = chain(&mut graph, 4);
    graph.set_local_transform(root, Transform::from_rotation(Quat::from_axis_angle(&Vec3::y_axis(), 0.4))).unwrap();
    graph.set_local_translation(leaf, Vec3::new(2.0, 0.0, -3.0)).unwrap();
    graph.add_light(root, Light::directional("sun", Vec3::new(0.0, -1.0, 0.0), Vec3::repeat(1.0))).unwrap();

    graph.update_geometric_state(root).unwrap();
    let transform = graph.world_transform(leaf).unwrap();
    let bound = graph.world_bound(root).unwrap();
    let lights = graph.world_light_list(leaf).unwrap();
    graph.reset_stats();

    graph.update_geometric_state(root).unwrap();

    assert_eq!(graph.world_transform(leaf).unwrap(), transform);
    assert_eq!(graph.world_bound(root).unwrap(), bound);
    assert_eq!(graph.world_light_list(leaf).unwrap(), lights);
    assert_eq!(graph.stats().transform_updates, 0);
    assert_eq!(graph.stats().bound_updates, 0);
    assert_eq!(graph.stats().light_list_updates, 0);

    let mut dirty = Vec::new();
    graph
        .depth_first_traversal(root, Default::default(), &mut |_: SpatialId, spatial: &crate::scene::Spatial| {
            if !spatial.refresh_flags().is_empty() {
                dirty.push(spatial.name().to_string());
            }
        })
        .unwrap();
    assert!(dirty.is_empty(), "dirty after update: {dirty:?}");
}

#[test]
fn test_child_composes_with_scaled_parent() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node("parent");
    let child = graph.create_node("child");
    graph.attach_child(parent, child).unwrap();
    graph
        .set_local_transform(
            parent,
            Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)).with_scale(Vec3::repeat(2.0)),
        )
        .unwrap();
    graph.set_local_translation(child, Vec3::new(1.0, 0.0, 0.0)).unwrap();

    graph.update_geometric_state(parent).unwrap();
    let world = graph.world_transform(child).unwrap();

    assert_relative_eq!(world.translation, Vec3::new(3.0, 2.0, 3.0));
    assert_relative_eq!(world.scale, Vec3::repeat(2.0));
    assert_relative_eq!(world.rotation, Quat::identity());
}

#[test]
fn test_node_bound_covers_children_in_any_order() {
    let slab = |min_x: f32, max_x: f32| {
        Mesh::new(
            vec![Vec3::new(min_x, 0.0, 0.0), Vec3::new(max_x, 1.0, 1.0)],
            Vec::new(),
        )
    };
    let expected: BoundingVolume =
        BoundingBox::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(5.0, 1.0, 1.0)).into();

    for order in [[0, 1, 2], [2, 0, 1], [1, 2, 0]] {
        let mut graph = SceneGraph::new();
        let root = graph.create_node("root");
        let ranges = [(0.0, 1.0), (2.0, 3.0), (4.0, 5.0)];
        for index in order {
            let (min_x, max_x) = ranges[index];
            let geometry = graph.create_geometry(format!("slab{index}"), slab(min_x, max_x), material());
            graph.attach_child(root, geometry).unwrap();
        }
        graph.update_geometric_state(root).unwrap();

        assert_eq!(graph.world_bound(root).unwrap(), Some(expected));
    }
}

#[test]
fn test_outside_parent_skips_child_frustum_tests() {
    let mut graph = SceneGraph::new();
    let root = graph.create_node("root");
    let group = graph.create_node("behind");
    graph.attach_child(root, group).unwrap();
    graph.set_local_translation(group, Vec3::new(0.0, 0.0, 50.0)).unwrap();
    let mut descendants = Vec::new();
    for i in 0..4 {
        let cube = graph.create_geometry(format!("cube{i}"), Mesh::cube(1.0), material());
        graph.set_local_translation(cube, Vec3::new(i as f32 * 3.0, 0.0, 0.0)).unwrap();
        graph.attach_child(group, cube).unwrap();
        descendants.push(cube);
    }
    graph.update_geometric_state(root).unwrap();

    let culler = CountingCuller::new(Camera::new(800, 600));
    assert!(!graph.check_culling(group, &culler).unwrap());
    assert_eq!(culler.frustum_tests.get(), 1);

    for cube in descendants {
        assert!(!graph.check_culling(cube, &culler).unwrap());
        assert_eq!(graph.get(cube).unwrap().last_frustum_intersection(), FrustumIntersect::Outside);
    }
    assert_eq!(culler.frustum_tests.get(), 1);
}

#[test]
fn test_detached_child_becomes_its_own_root() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_node("parent");
    let child = graph.create_node("child");
    graph.attach_child(parent, child).unwrap();
    graph.set_local_translation(parent, Vec3::new(10.0, 0.0, 0.0)).unwrap();
    graph.set_local_translation(child, Vec3::new(1.0, 1.0, 1.0)).unwrap();
    graph.update_geometric_state(parent).unwrap();
    assert_relative_eq!(graph.world_translation(child).unwrap(), Vec3::new(11.0, 1.0, 1.0));

    assert!(graph.detach_child(parent, child).unwrap());

    assert_relative_eq!(graph.world_translation(child).unwrap(), Vec3::new(1.0, 1.0, 1.0));
    graph.update_geometric_state(child).unwrap();
    graph.update_geometric_state(parent).unwrap();
    assert_eq!(graph.world_bound(parent).unwrap(), None);
}

#[test]
fn test_culling_stale_bound_is_rejected() {
    let mut graph = SceneGraph::new();
    let (root, leaf) = chain(&mut graph, 2);
    graph.update_geometric_state(root).unwrap();
    let camera = Camera::new(800, 600);

    graph
        .modify_mesh(leaf, |mesh| mesh.set_positions(vec![Vec3::zeros(), Vec3::repeat(4.0)]))
        .unwrap();

    assert_eq!(
        graph.check_culling(leaf, &camera),
        Err(SceneError::SceneNotUpdated {
            name: "leaf".to_string(),
            flags: RefreshFlags::BOUND,
        })
    );
    assert!(matches!(
        graph.check_culling(root, &camera),
        Err(SceneError::SceneNotUpdated { .. })
    ));
}

#[test]
fn test_verification_catches_nothing_after_normal_update() {
    let config = SceneConfig::new().with_verification(true);
    let mut graph = SceneGraph::with_config(config);
    let (root, leaf) = chain(&mut graph, 6);
    graph.rotate(leaf, Quat::from_axis_angle(&Vec3::z_axis(), 1.0)).unwrap();
    graph.update_geometric_state(root).unwrap();

    // A lone accessor resolves part of the tree; the next update finishes it
    graph.move_local(root, Vec3::x()).unwrap();
    graph.world_transform(root).unwrap();
    graph.update_geometric_state(root).unwrap();
    assert!(graph.get(leaf).unwrap().refresh_flags().is_empty());
}
