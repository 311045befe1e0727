//! Scene graph tests over the fixed solar manifest: entity count and order,
//! deterministic animation, and binding immutability. The manifest is
//! assembled through the real registry (shader compilation included) but
//! with fabricated geometry handles — no GPU required.

use cgmath::{EuclideanSpace, InnerSpace, MetricSpace};

use orrery::data_structures::mesh::GeometryHandle;
use orrery::data_structures::scene_graph::{RenderLayer, Scene};
use orrery::registry::ShaderRegistry;
use orrery::solar::{SolarGeometry, solar_scene};

fn test_geometry() -> SolarGeometry {
    SolarGeometry {
        sphere: GeometryHandle(0),
        ring: GeometryHandle(1),
        shuttle: GeometryHandle(2),
        skybox: GeometryHandle(3),
    }
}

fn build_scene() -> Scene {
    let mut registry = ShaderRegistry::new();
    solar_scene(&mut registry, test_geometry()).unwrap()
}

#[test]
fn manifest_yields_ten_entities_skybox_first() {
    let mut scene = build_scene();
    scene.update(0.0);

    let visible: Vec<_> = scene.visible().collect();
    assert_eq!(visible.len(), 10);
    assert_eq!(visible[0].layer, RenderLayer::Sky);
    assert_eq!(visible[0].body.name, "skybox");
    for entity in &visible[1..] {
        assert_eq!(entity.layer, RenderLayer::Opaque);
    }

    let names: Vec<_> = visible.iter().map(|v| v.body.name.as_str()).collect();
    assert!(names.contains(&"sun"));
    assert!(names.contains(&"earth"));
    assert!(names.contains(&"moon"));
    assert!(names.contains(&"shuttle"));
}

#[test]
fn visible_order_is_stable_and_material_grouped() {
    let mut scene = build_scene();
    scene.update(2.0);

    let first: Vec<_> = scene.visible().map(|v| v.index).collect();
    let second: Vec<_> = scene.visible().map(|v| v.index).collect();
    assert_eq!(first, second);

    // Equal material handles must be adjacent among the opaque bodies.
    let materials: Vec<_> = scene
        .visible()
        .filter(|v| v.layer == RenderLayer::Opaque)
        .map(|v| v.material)
        .collect();
    for (i, material) in materials.iter().enumerate() {
        if let Some(later) = materials[i + 1..].iter().position(|m| m == material) {
            // Any later occurrence must be contiguous with this run.
            assert_eq!(
                materials[i + 1..i + 1 + later]
                    .iter()
                    .filter(|m| *m != material)
                    .count(),
                0,
                "material group split across the opaque sequence"
            );
        }
    }
}

#[test]
fn update_is_idempotent_at_fixed_time() {
    let mut scene = build_scene();

    scene.update(3.25);
    let first: Vec<_> = scene
        .bodies()
        .iter()
        .map(|b| b.transform().clone())
        .collect();

    scene.update(3.25);
    let second: Vec<_> = scene
        .bodies()
        .iter()
        .map(|b| b.transform().clone())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn update_changes_only_transforms() {
    let mut scene = build_scene();
    scene.update(0.0);

    let before: Vec<_> = scene
        .bodies()
        .iter()
        .map(|b| (b.name.clone(), b.material, b.geometry))
        .collect();
    let earth_before = scene.body(4).transform().clone();

    scene.update(1.0);

    let after: Vec<_> = scene
        .bodies()
        .iter()
        .map(|b| (b.name.clone(), b.material, b.geometry))
        .collect();
    assert_eq!(before, after);
    assert_ne!(&earth_before, scene.body(4).transform());
}

#[test]
fn orbit_preserves_radius() {
    let mut scene = build_scene();
    let earth_index = scene
        .bodies()
        .iter()
        .position(|b| b.name == "earth")
        .unwrap();

    for t in [0.0, 1.5, 4.0, 100.0] {
        scene.update(t);
        let position = scene.body(earth_index).transform().position;
        assert!((position.magnitude() - 13.0).abs() < 1e-3, "t={t}");
        assert_eq!(position.y, 0.0);
    }
}

#[test]
fn moon_tracks_earth() {
    let mut scene = build_scene();
    let earth = scene
        .bodies()
        .iter()
        .position(|b| b.name == "earth")
        .unwrap();
    let moon = scene
        .bodies()
        .iter()
        .position(|b| b.name == "moon")
        .unwrap();

    let mut separations = Vec::new();
    for t in [0.0, 2.0, 7.5, 33.0] {
        scene.update(t);
        let a = cgmath::Point3::from_vec(scene.body(earth).transform().position);
        let b = cgmath::Point3::from_vec(scene.body(moon).transform().position);
        separations.push(a.distance(b));
    }
    for pair in separations.windows(2) {
        assert!((pair[0] - pair[1]).abs() < 1e-3);
    }
}

#[test]
fn sun_anchors_the_light_at_origin() {
    let mut scene = build_scene();
    scene.update(10.0);

    let sun = scene.light_anchor().expect("manifest sets a light anchor");
    assert_eq!(sun.name, "sun");
    assert_eq!(sun.transform().position, cgmath::Vector3::new(0.0, 0.0, 0.0));
}

#[test]
fn layers_ride_bodies_without_becoming_entities() {
    let mut scene = build_scene();
    scene.update(1.0);

    assert_eq!(scene.visible().count(), 10);

    let earth = scene
        .bodies()
        .iter()
        .find(|b| b.name == "earth")
        .unwrap();
    assert_eq!(earth.layers().len(), 1);
    assert_eq!(earth.layers()[0].name, "clouds");
    // The cloud shell sits on the planet, scaled slightly outward.
    let shell = earth.layers()[0].transform();
    assert!(shell.position.distance(earth.transform().position) < 1e-4);
    assert!(shell.scale > earth.transform().scale);

    let saturn = scene
        .bodies()
        .iter()
        .find(|b| b.name == "saturn")
        .unwrap();
    assert_eq!(saturn.layers()[0].name, "rings");
}

#[test]
fn cloud_layer_spins_independently_of_the_planet() {
    let mut scene = build_scene();
    let earth_index = scene
        .bodies()
        .iter()
        .position(|b| b.name == "earth")
        .unwrap();

    scene.update(2.0);
    let earth_rot = scene.body(earth_index).transform().rotation;
    let cloud_rot = scene.body(earth_index).layers()[0].transform().rotation;
    assert_ne!(earth_rot, cloud_rot);
}
