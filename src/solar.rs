//! The fixed solar-system manifest.
//!
//! Eight celestial bodies, a shuttle, and a skybox — assembled from the
//! provider's geometry handles with one material per body. Surface variety
//! is pure parameterization: the three gas giants share one program, the
//! moon and the inner rocky planet share another.

use std::collections::BTreeMap;

use cgmath::{Rad, Vector3};

use crate::data_structures::{
    mesh::GeometryHandle,
    scene_graph::{Body, Orbit, RenderLayer, Scene, Spin, SurfaceLayer},
    transform::Transform,
};
use crate::error::RenderError;
use crate::registry::{ShaderRegistry, SurfaceConfig, UniformValue};
use crate::surfaces::{SurfaceCatalog, SurfaceKind};

/// Geometry the asset provider must supply for the manifest.
#[derive(Clone, Copy, Debug)]
pub struct SolarGeometry {
    /// Unit sphere, used by every celestial body.
    pub sphere: GeometryHandle,
    /// Thin annulus in the XZ plane, inner radius ~1.3, outer ~2.3.
    pub ring: GeometryHandle,
    /// The spacecraft model.
    pub shuttle: GeometryHandle,
    /// Unit cube for the skybox.
    pub skybox: GeometryHandle,
}

fn bindings(entries: Vec<(&str, UniformValue)>) -> BTreeMap<String, UniformValue> {
    entries
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Build the solar scene: compile the surface catalog, create every
/// material, and lay out the bodies. Compilation or binding failures abort
/// setup — nothing renders without its materials.
pub fn solar_scene(
    registry: &mut ShaderRegistry,
    geometry: SolarGeometry,
) -> Result<Scene, RenderError> {
    let catalog = SurfaceCatalog::compile(registry)?;

    let sky = registry.create_material(
        "starfield",
        catalog.shader(SurfaceKind::Sky),
        &bindings(vec![
            ("background", UniformValue::Vec4([0.05, 0.06, 0.13, 1.0])),
            ("star_color", UniformValue::Vec4([0.95, 0.95, 1.0, 1.0])),
            ("star_density", UniformValue::F32(48.0)),
            ("star_threshold", UniformValue::F32(0.995)),
        ]),
        SurfaceConfig::sky(),
    )?;

    let sun = registry.create_material(
        "sun",
        catalog.shader(SurfaceKind::Emissive),
        &bindings(vec![
            ("core_color", UniformValue::Vec4([1.0, 0.95, 0.6, 1.0])),
            ("edge_color", UniformValue::Vec4([1.0, 0.7, 0.15, 1.0])),
            ("granulation_scale", UniformValue::F32(20.0)),
            ("limb_min", UniformValue::F32(0.7)),
            ("limb_max", UniformValue::F32(1.4)),
        ]),
        SurfaceConfig::opaque(),
    )?;

    let ash = registry.create_material(
        "ash",
        catalog.shader(SurfaceKind::Cratered),
        &bindings(vec![
            ("base_color", UniformValue::Vec4([0.88, 0.65, 0.42, 1.0])),
            ("dark_color", UniformValue::Vec4([0.22, 0.10, 0.08, 1.0])),
            ("rough_scale", UniformValue::F32(6.0)),
            ("cell_scale_x", UniformValue::F32(12.0)),
            ("cell_scale_y", UniformValue::F32(6.0)),
            ("deep_threshold", UniformValue::F32(0.80)),
            ("soft_threshold", UniformValue::F32(0.65)),
            ("specular_strength", UniformValue::F32(0.05)),
        ]),
        SurfaceConfig::opaque(),
    )?;

    let ember = registry.create_material(
        "ember",
        catalog.shader(SurfaceKind::Terrestrial),
        &bindings(vec![
            ("molten_base", UniformValue::Vec4([1.0, 0.25, 0.05, 1.0])),
            ("molten_hot", UniformValue::Vec4([1.0, 0.95, 0.45, 1.0])),
            ("crust_light", UniformValue::Vec4([0.95, 0.96, 0.99, 1.0])),
            ("crust_dark", UniformValue::Vec4([0.75, 0.78, 0.82, 1.0])),
            ("crack_color", UniformValue::Vec4([0.05, 0.03, 0.04, 1.0])),
            ("mask_scale", UniformValue::F32(3.0)),
            ("mask_threshold", UniformValue::F32(0.80)),
            ("detail_scale", UniformValue::F32(18.0)),
            ("soot_strength", UniformValue::F32(0.6)),
        ]),
        SurfaceConfig::opaque(),
    )?;

    let earth = registry.create_material(
        "earth",
        catalog.shader(SurfaceKind::EarthLike),
        &bindings(vec![
            ("ocean_deep", UniformValue::Vec4([0.02, 0.08, 0.25, 1.0])),
            ("ocean_shallow", UniformValue::Vec4([0.0, 0.35, 0.60, 1.0])),
            ("tropical", UniformValue::Vec4([0.02, 0.35, 0.05, 1.0])),
            ("temperate", UniformValue::Vec4([0.15, 0.40, 0.10, 1.0])),
            ("desert", UniformValue::Vec4([0.75, 0.65, 0.40, 1.0])),
            ("tundra", UniformValue::Vec4([0.60, 0.60, 0.55, 1.0])),
            ("ice_color", UniformValue::Vec4([0.95, 0.98, 1.0, 1.0])),
            ("continent_scale", UniformValue::F32(3.0)),
            ("continent_threshold", UniformValue::F32(0.50)),
            ("ice_latitude", UniformValue::F32(0.55)),
            ("limb_strength", UniformValue::F32(0.2)),
        ]),
        SurfaceConfig::opaque(),
    )?;

    let clouds = registry.create_material(
        "earth-clouds",
        catalog.shader(SurfaceKind::Cloud),
        &bindings(vec![
            ("cloud_color", UniformValue::Vec4([1.0, 1.0, 1.0, 1.0])),
            ("coverage_scale", UniformValue::F32(12.0)),
            ("coverage_min", UniformValue::F32(0.70)),
            ("coverage_max", UniformValue::F32(0.88)),
            ("drift_rate", UniformValue::F32(0.012)),
            ("opacity", UniformValue::F32(0.55)),
        ]),
        SurfaceConfig::blended(),
    )?;

    let moon = registry.create_material(
        "moon",
        catalog.shader(SurfaceKind::Cratered),
        &bindings(vec![
            ("base_color", UniformValue::Vec4([0.7, 0.7, 0.7, 1.0])),
            ("dark_color", UniformValue::Vec4([0.3, 0.3, 0.35, 1.0])),
            ("rough_scale", UniformValue::F32(6.0)),
            ("cell_scale_x", UniformValue::F32(16.0)),
            ("cell_scale_y", UniformValue::F32(8.0)),
            ("deep_threshold", UniformValue::F32(0.80)),
            ("soft_threshold", UniformValue::F32(0.65)),
            ("specular_strength", UniformValue::F32(0.15)),
        ]),
        SurfaceConfig::opaque(),
    )?;

    let banded = registry.create_material(
        "banded-giant",
        catalog.shader(SurfaceKind::GasGiant),
        &bindings(vec![
            ("band_light", UniformValue::Vec4([0.9, 0.8, 0.65, 1.0])),
            ("band_dark", UniformValue::Vec4([0.5, 0.4, 0.3, 1.0])),
            ("spot_color", UniformValue::Vec4([1.0, 0.6, 0.3, 1.0])),
            ("equator_color", UniformValue::Vec4([0.0, 0.0, 0.0, 1.0])),
            ("spot_center", UniformValue::Vec2([0.25, 0.55])),
            ("band_freq", UniformValue::F32(14.0)),
            ("swirl_strength", UniformValue::F32(0.2)),
            ("second_band_weight", UniformValue::F32(0.3)),
            ("spot_radius", UniformValue::F32(0.22)),
            ("spot_strength", UniformValue::F32(0.9)),
            ("equator_width", UniformValue::F32(0.08)),
            ("equator_strength", UniformValue::F32(0.0)),
        ]),
        SurfaceConfig::opaque(),
    )?;

    let ring = registry.create_material(
        "giant-ring",
        catalog.shader(SurfaceKind::Ring),
        &bindings(vec![
            ("inner_color", UniformValue::Vec4([0.95, 0.9, 0.8, 1.0])),
            ("outer_color", UniformValue::Vec4([0.6, 0.55, 0.5, 1.0])),
            ("band_freq", UniformValue::F32(35.0)),
            ("inner_radius", UniformValue::F32(1.3)),
            ("outer_radius", UniformValue::F32(2.3)),
            ("opacity", UniformValue::F32(0.85)),
        ]),
        SurfaceConfig::blended(),
    )?;

    let cyan = registry.create_material(
        "redband-giant",
        catalog.shader(SurfaceKind::GasGiant),
        &bindings(vec![
            ("band_light", UniformValue::Vec4([0.75, 0.92, 0.98, 1.0])),
            ("band_dark", UniformValue::Vec4([0.50, 0.78, 0.90, 1.0])),
            ("spot_color", UniformValue::Vec4([0.0, 0.0, 0.0, 1.0])),
            ("equator_color", UniformValue::Vec4([0.90, 0.20, 0.15, 1.0])),
            ("spot_center", UniformValue::Vec2([0.5, 0.5])),
            ("band_freq", UniformValue::F32(12.0)),
            ("swirl_strength", UniformValue::F32(0.1)),
            ("second_band_weight", UniformValue::F32(0.0)),
            ("spot_radius", UniformValue::F32(0.2)),
            ("spot_strength", UniformValue::F32(0.0)),
            ("equator_width", UniformValue::F32(0.08)),
            ("equator_strength", UniformValue::F32(0.9)),
        ]),
        SurfaceConfig::opaque(),
    )?;

    let lilac = registry.create_material(
        "lilac-giant",
        catalog.shader(SurfaceKind::GasGiant),
        &bindings(vec![
            ("band_light", UniformValue::Vec4([0.78, 0.72, 0.98, 1.0])),
            ("band_dark", UniformValue::Vec4([0.50, 0.40, 0.85, 1.0])),
            ("spot_color", UniformValue::Vec4([0.0, 0.0, 0.0, 1.0])),
            ("equator_color", UniformValue::Vec4([0.0, 0.0, 0.0, 1.0])),
            ("spot_center", UniformValue::Vec2([0.5, 0.5])),
            ("band_freq", UniformValue::F32(10.0)),
            ("swirl_strength", UniformValue::F32(0.04)),
            ("second_band_weight", UniformValue::F32(0.0)),
            ("spot_radius", UniformValue::F32(0.2)),
            ("spot_strength", UniformValue::F32(0.0)),
            ("equator_width", UniformValue::F32(0.08)),
            ("equator_strength", UniformValue::F32(0.0)),
        ]),
        SurfaceConfig::opaque(),
    )?;

    let hull = registry.create_material(
        "shuttle-hull",
        catalog.shader(SurfaceKind::Hull),
        &bindings(vec![
            ("hull_color", UniformValue::Vec4([0.702, 0.871, 0.722, 1.0])),
            ("accent_color", UniformValue::Vec4([0.137, 0.125, 0.126, 1.0])),
            ("panel_color", UniformValue::Vec4([0.819, 0.827, 0.847, 1.0])),
            ("panel_scale", UniformValue::Vec2([10.0, 4.0])),
            ("seam_width", UniformValue::F32(0.08)),
            ("window_density", UniformValue::F32(0.55)),
        ]),
        SurfaceConfig::opaque(),
    )?;

    let mut scene = Scene::new();
    let origin = Vector3::new(0.0, 0.0, 0.0);

    scene.add_body(Body::new(
        "skybox",
        geometry.skybox,
        sky,
        RenderLayer::Sky,
        Transform::new(),
    ));

    let sun_index = scene.add_body(
        Body::new(
            "sun",
            geometry.sphere,
            sun,
            RenderLayer::Opaque,
            Transform::at(origin).scaled(3.0),
        )
        .with_spin(Spin::about_y(0.05)),
    );
    scene.set_light_anchor(sun_index);

    scene.add_body(
        Body::new(
            "ash",
            geometry.sphere,
            ash,
            RenderLayer::Opaque,
            Transform::new().scaled(0.5),
        )
        .with_spin(Spin::about_y(0.8))
        .with_orbit(Orbit {
            center: origin,
            radius: 6.0,
            rate: 0.50,
            phase: 0.0,
        }),
    );

    scene.add_body(
        Body::new(
            "ember",
            geometry.sphere,
            ember,
            RenderLayer::Opaque,
            Transform::new().scaled(0.7),
        )
        .with_spin(Spin::about_y(0.6))
        .with_orbit(Orbit {
            center: origin,
            radius: 9.0,
            rate: 0.38,
            phase: 1.1,
        }),
    );

    scene.add_body(
        Body::new(
            "earth",
            geometry.sphere,
            earth,
            RenderLayer::Opaque,
            Transform::new(),
        )
        .with_spin(Spin::about_y(1.0))
        .with_orbit(Orbit {
            center: origin,
            radius: 13.0,
            rate: 0.30,
            phase: 2.4,
        })
        .with_layer(
            SurfaceLayer::new(
                "clouds",
                geometry.sphere,
                clouds,
                Transform::new().scaled(1.03),
            )
            .with_spin(Spin::about_y(0.13)),
        ),
    );

    // Same centre, rate, and phase as earth at a slightly larger radius, so
    // the moon tracks its planet while staying a pure function of time.
    scene.add_body(
        Body::new(
            "moon",
            geometry.sphere,
            moon,
            RenderLayer::Opaque,
            Transform::new().scaled(0.27),
        )
        .with_spin(Spin::about_y(1.3))
        .with_orbit(Orbit {
            center: origin,
            radius: 14.4,
            rate: 0.30,
            phase: 2.4,
        }),
    );

    scene.add_body(
        Body::new(
            "saturn",
            geometry.sphere,
            banded,
            RenderLayer::Opaque,
            Transform::new().scaled(1.6),
        )
        .with_spin(Spin::about_y(0.7))
        .with_orbit(Orbit {
            center: origin,
            radius: 18.0,
            rate: 0.18,
            phase: 4.0,
        })
        .with_layer(
            SurfaceLayer::new(
                "rings",
                geometry.ring,
                ring,
                Transform::new().rotated(Vector3::unit_z(), Rad(0.2)),
            )
            .with_spin(Spin::about_y(0.3)),
        ),
    );

    scene.add_body(
        Body::new(
            "neptune",
            geometry.sphere,
            cyan,
            RenderLayer::Opaque,
            Transform::new().scaled(1.2),
        )
        .with_spin(Spin::about_y(0.9))
        .with_orbit(Orbit {
            center: origin,
            radius: 23.0,
            rate: 0.13,
            phase: 5.3,
        }),
    );

    scene.add_body(
        Body::new(
            "uranus",
            geometry.sphere,
            lilac,
            RenderLayer::Opaque,
            Transform::new().scaled(1.1),
        )
        .with_spin(Spin::about_y(0.85))
        .with_orbit(Orbit {
            center: origin,
            radius: 27.0,
            rate: 0.10,
            phase: 0.7,
        }),
    );

    scene.add_body(
        Body::new(
            "shuttle",
            geometry.shuttle,
            hull,
            RenderLayer::Opaque,
            Transform::new().scaled(0.25),
        )
        .with_spin(Spin::about_y(1.5))
        .with_orbit(Orbit {
            center: origin,
            radius: 11.0,
            rate: 0.45,
            phase: 3.3,
        }),
    );

    Ok(scene)
}
