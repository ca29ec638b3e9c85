//! Solar system demo
//!
//! Builds a small hierarchy of orbiting bodies, drives it with controls for a
//! fixed number of frames and reports how much work each frame cost. An
//! optional engine configuration file (`.toml` or `.ron`) can be passed as
//! the first argument.

use std::sync::Arc;

use scene_engine::foundation::logging;
use scene_engine::prelude::*;
use scene_engine::render::BoundShape;

const FRAMES: usize = 120;
const TIME_PER_FRAME: f32 = 1.0 / 60.0;
const ASTEROIDS: usize = 24;

/// Spins its spatial around the Y axis
struct Spin {
    radians_per_second: f32,
}

impl Control for Spin {
    fn update(&mut self, graph: &mut SceneGraph, spatial: SpatialId, tpf: f32) -> SceneResult<()> {
        graph.rotate(spatial, Quat::from_axis_angle(&Vec3::y_axis(), self.radians_per_second * tpf))
    }

    fn clone_for_spatial(&self) -> Option<Box<dyn Control>> {
        Some(Box::new(Spin {
            radians_per_second: self.radians_per_second,
        }))
    }
}

struct SolarSystem {
    root: SpatialId,
    earth_pivot: SpatialId,
    belt: SpatialId,
}

fn build_scene(graph: &mut SceneGraph) -> SceneResult<SolarSystem> {
    let rock = Arc::new(Material::new("rock").with_color(0.5, 0.45, 0.4));
    let ocean = Arc::new(Material::new("ocean").with_color(0.1, 0.3, 0.8));
    let star = Arc::new(Material::new("star").with_color(1.0, 0.9, 0.5));

    let root = graph.create_node("system");
    graph.add_light(root, Light::ambient("starlight", Vec3::repeat(0.1)))?;

    let sun = graph.create_geometry("sun", Mesh::cube(3.0).with_bound_shape(BoundShape::Sphere), star);
    graph.set_shadow_mode(sun, ShadowMode::Cast)?;
    graph.add_light(sun, Light::point("corona", Vec3::zeros(), 200.0, Vec3::new(1.0, 0.95, 0.8)))?;
    graph.attach_child(root, sun)?;

    let earth_pivot = graph.create_node("earth-pivot");
    graph.add_control(earth_pivot, Box::new(Spin { radians_per_second: 0.5 }))?;
    graph.attach_child(root, earth_pivot)?;

    let earth = graph.create_node("earth");
    graph.set_local_translation(earth, Vec3::new(20.0, 0.0, 0.0))?;
    graph.add_control(earth, Box::new(Spin { radians_per_second: 2.0 }))?;
    graph.attach_child(earth_pivot, earth)?;
    let surface = graph.create_geometry("earth-surface", Mesh::cube(1.0), ocean);
    graph.attach_child(earth, surface)?;

    let moon_pivot = graph.create_node("moon-pivot");
    graph.add_control(moon_pivot, Box::new(Spin { radians_per_second: 1.5 }))?;
    graph.attach_child(earth, moon_pivot)?;
    let moon = graph.create_geometry("moon", Mesh::cube(0.3), Arc::clone(&rock));
    graph.set_local_translation(moon, Vec3::new(3.0, 0.0, 0.0))?;
    graph.attach_child(moon_pivot, moon)?;

    let belt = graph.create_node("belt");
    graph.add_control(belt, Box::new(Spin { radians_per_second: 0.1 }))?;
    graph.attach_child(root, belt)?;
    for i in 0..ASTEROIDS {
        let angle = i as f32 / ASTEROIDS as f32 * std::f32::consts::TAU;
        let asteroid = graph.create_geometry(format!("asteroid{i}"), Mesh::cube(0.4), Arc::clone(&rock));
        graph.set_local_translation(asteroid, Vec3::new(angle.cos() * 35.0, 0.0, angle.sin() * 35.0))?;
        graph.attach_child(belt, asteroid)?;
    }

    Ok(SolarSystem {
        root,
        earth_pivot,
        belt,
    })
}

/// One logical and geometric update followed by visibility collection
fn run_frame(
    graph: &mut SceneGraph,
    root: SpatialId,
    viewport: &ViewPort,
    queue: &mut RenderQueue,
) -> SceneResult<()> {
    graph.reset_stats();
    graph.update_logical_state(root, TIME_PER_FRAME)?;
    graph.update_geometric_state(root)?;

    queue.clear();
    graph.collect_visible(root, viewport, queue)
}

fn main_camera() -> Camera {
    let mut camera = Camera::new(1280, 720);
    camera.set_location(Vec3::new(0.0, 40.0, 80.0));
    camera.look_at(&Vec3::zeros(), &Vec3::y());
    camera
}

fn load_config() -> Result<EngineConfig, ConfigError> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init_with_level(&config.log_level);
    log::info!("Starting solar system demo...");

    let mut graph = SceneGraph::with_config(config.scene.clone());
    let system = build_scene(&mut graph)?;
    graph.update_geometric_state(system.root)?;

    let batches = graph.batch(system.belt)?;
    log::info!("Asteroid belt merged into {batches} batch(es)");

    let viewport = ViewPort::new("main", main_camera());
    let mut queue = RenderQueue::new();

    for frame in 0..FRAMES {
        run_frame(&mut graph, system.root, &viewport, &mut queue)?;

        if frame % 30 == 0 {
            let stats = graph.stats();
            log::info!(
                "Frame {frame}: {} queued, {} transforms, {} bounds, {} light lists, {} ancestor visits",
                queue.total_count(),
                stats.transform_updates,
                stats.bound_updates,
                stats.light_list_updates,
                stats.ancestor_visits
            );
        }
    }

    let earth_pivot = graph.world_rotation(system.earth_pivot)?;
    log::info!("Earth pivot rotation after {FRAMES} frames: {:.3} rad", earth_pivot.angle());

    let snapshot = graph.snapshot(system.root)?;
    log::info!(
        "Snapshot holds {} spatials ({} bytes of RON)",
        snapshot.spatial_count(),
        snapshot.to_ron()?.len()
    );
    if config.debug_mode {
        log::debug!("{graph:#?}");
    }

    log::info!("Demo finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solar_system_runs_a_frame() {
        let mut graph = SceneGraph::new();
        let system = build_scene(&mut graph).unwrap();
        graph.update_geometric_state(system.root).unwrap();
        assert_eq!(graph.batch(system.belt).unwrap(), 1);

        let viewport = ViewPort::new("main", main_camera());
        let mut queue = RenderQueue::new();
        run_frame(&mut graph, system.root, &viewport, &mut queue).unwrap();

        assert!(queue.total_count() > 0);
        assert!(graph.world_rotation(system.earth_pivot).unwrap().angle() > 0.0);
    }
}
