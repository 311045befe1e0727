//! Frame planning tests: pass ordering, transparent sorting, lighting
//! consistency, and plan determinism. Plans are pure data, so none of this
//! touches a GPU.

use cgmath::Point3;

use orrery::data_structures::mesh::GeometryHandle;
use orrery::data_structures::scene_graph::Scene;
use orrery::pipelines::light::LightUniform;
use orrery::registry::ShaderRegistry;
use orrery::render::{Pass, plan_frame};
use orrery::solar::{SolarGeometry, solar_scene};

fn build_scene() -> Scene {
    let mut registry = ShaderRegistry::new();
    solar_scene(
        &mut registry,
        SolarGeometry {
            sphere: GeometryHandle(0),
            ring: GeometryHandle(1),
            shuttle: GeometryHandle(2),
            skybox: GeometryHandle(3),
        },
    )
    .unwrap()
}

fn eye() -> Point3<f32> {
    Point3::new(0.0, 30.0, 20.0)
}

#[test]
fn passes_are_ordered_sky_opaque_transparent() {
    let mut scene = build_scene();
    scene.update(1.0);

    let plan = plan_frame(&scene, eye(), LightUniform::sunlight());
    let passes: Vec<Pass> = plan.commands().iter().map(|c| c.pass).collect();

    assert!(!passes.is_empty());
    assert_eq!(passes[0], Pass::Sky);
    for pair in passes.windows(2) {
        assert!(pair[0] <= pair[1], "pass order regressed: {passes:?}");
    }

    let opaque = passes.iter().filter(|p| **p == Pass::Opaque).count();
    assert_eq!(opaque, 9);
}

#[test]
fn attached_layers_expand_into_the_transparent_tail() {
    let mut scene = build_scene();
    scene.update(0.0);

    let plan = plan_frame(&scene, eye(), LightUniform::sunlight());
    let transparent: Vec<_> = plan
        .commands()
        .iter()
        .filter(|c| c.pass == Pass::Transparent)
        .collect();

    // Earth's cloud shell and the ringed giant's rings.
    assert_eq!(transparent.len(), 2);
    let labels: Vec<_> = transparent.iter().map(|c| c.label.as_str()).collect();
    assert!(labels.contains(&"earth/clouds"));
    assert!(labels.contains(&"saturn/rings"));

    // Ten entities plus two layer draws.
    assert_eq!(plan.commands().len(), 12);
}

#[test]
fn transparent_commands_sort_back_to_front() {
    let mut scene = build_scene();
    scene.update(4.2);

    let plan = plan_frame(&scene, eye(), LightUniform::sunlight());
    let depths: Vec<f32> = plan
        .commands()
        .iter()
        .filter(|c| c.pass == Pass::Transparent)
        .map(|c| c.view_depth)
        .collect();

    for pair in depths.windows(2) {
        assert!(pair[0] >= pair[1], "transparent draws not back-to-front");
    }
}

#[test]
fn one_light_snapshot_per_plan() {
    let mut scene = build_scene();
    scene.update(2.0);

    let mut light = LightUniform::sunlight();
    light.position = [1.0, 2.0, 3.0];
    light.intensity = 1.5;

    let plan = plan_frame(&scene, eye(), light);
    // Every lit draw in the frame reads exactly this snapshot from one
    // buffer; the plan carries no per-command light state to diverge from.
    assert_eq!(plan.light(), light);
}

#[test]
fn planning_is_deterministic_for_a_given_time() {
    let mut scene = build_scene();

    scene.update(6.0);
    let first = plan_frame(&scene, eye(), LightUniform::sunlight());

    scene.update(6.0);
    let second = plan_frame(&scene, eye(), LightUniform::sunlight());

    assert_eq!(first.commands().len(), second.commands().len());
    for (a, b) in first.commands().iter().zip(second.commands().iter()) {
        assert_eq!(a.pass, b.pass);
        assert_eq!(a.material, b.material);
        assert_eq!(a.geometry, b.geometry);
        assert_eq!(a.transform, b.transform);
        assert_eq!(a.label, b.label);
    }
}

#[test]
fn opaque_segment_stays_material_grouped() {
    let mut scene = build_scene();
    scene.update(3.0);

    let plan = plan_frame(&scene, eye(), LightUniform::sunlight());
    let materials: Vec<_> = plan
        .commands()
        .iter()
        .filter(|c| c.pass == Pass::Opaque)
        .map(|c| c.material)
        .collect();

    let mut runs = 1;
    for pair in materials.windows(2) {
        if pair[0] != pair[1] {
            runs += 1;
        }
    }
    let mut distinct = materials.clone();
    distinct.sort();
    distinct.dedup();
    // Grouped order means one contiguous run per distinct material.
    assert_eq!(runs, distinct.len());
}
