//! Scene graph: the ordered collection of drawable bodies.
//!
//! The scene is plain data — handles, transforms, and animation parameters.
//! GPU buffers for the transforms live with the frame loop, which keeps the
//! whole scene unit-testable without a device.
//!
//! Transforms are a pure function of absolute scene time: [`Scene::update`]
//! with the same `t` always produces the same transforms, so scene state is
//! fully reproducible from a time value.

use cgmath::{Rad, Rotation3};

use crate::data_structures::{mesh::GeometryHandle, transform::Transform};
use crate::registry::MaterialHandle;

/// Draw-order hint for a body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Background, drawn first and clamped to the far plane.
    Sky,
    /// Depth-tested opaque geometry.
    Opaque,
    /// Alpha-blended geometry, drawn after all opaque draws.
    Blended,
}

/// Axial rotation at a constant rate (radians per second).
#[derive(Clone, Copy, Debug)]
pub struct Spin {
    pub axis: cgmath::Vector3<f32>,
    pub rate: f32,
    pub phase: f32,
}

impl Spin {
    pub fn about_y(rate: f32) -> Self {
        Self {
            axis: cgmath::Vector3::unit_y(),
            rate,
            phase: 0.0,
        }
    }

    fn rotation_at(&self, t: f32) -> cgmath::Quaternion<f32> {
        cgmath::Quaternion::from_axis_angle(self.axis, Rad(self.rate * t + self.phase))
    }
}

/// Circular orbit in the XZ plane around a fixed centre.
#[derive(Clone, Copy, Debug)]
pub struct Orbit {
    pub center: cgmath::Vector3<f32>,
    pub radius: f32,
    pub rate: f32,
    pub phase: f32,
}

impl Orbit {
    fn position_at(&self, t: f32) -> cgmath::Vector3<f32> {
        let angle = self.rate * t + self.phase;
        self.center + cgmath::Vector3::new(angle.cos(), 0.0, angle.sin()) * self.radius
    }
}

/// An alpha-blended surface layer attached to a body (gas-giant ring, cloud
/// shell). Layers are not scene entities: they ride on the owning body's
/// transform with their own offset and spin, and expand into extra blended
/// draw commands after all opaque geometry.
#[derive(Clone, Debug)]
pub struct SurfaceLayer {
    pub name: String,
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub offset: Transform,
    pub spin: Option<Spin>,
    transform: Transform,
}

impl SurfaceLayer {
    pub fn new(
        name: &str,
        geometry: GeometryHandle,
        material: MaterialHandle,
        offset: Transform,
    ) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            material,
            transform: offset.clone(),
            offset,
            spin: None,
        }
    }

    pub fn with_spin(mut self, spin: Spin) -> Self {
        self.spin = Some(spin);
        self
    }

    /// World transform as of the last scene update.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }
}

/// A drawable body: transform, geometry and material references, animation
/// parameters, and attached blended layers.
#[derive(Clone, Debug)]
pub struct Body {
    pub name: String,
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub layer: RenderLayer,
    pub spin: Option<Spin>,
    pub orbit: Option<Orbit>,
    base: Transform,
    transform: Transform,
    layers: Vec<SurfaceLayer>,
}

impl Body {
    pub fn new(
        name: &str,
        geometry: GeometryHandle,
        material: MaterialHandle,
        layer: RenderLayer,
        base: Transform,
    ) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            material,
            layer,
            spin: None,
            orbit: None,
            transform: base.clone(),
            base,
            layers: Vec::new(),
        }
    }

    pub fn with_spin(mut self, spin: Spin) -> Self {
        self.spin = Some(spin);
        self
    }

    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self
    }

    pub fn with_layer(mut self, layer: SurfaceLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// World transform as of the last scene update.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn layers(&self) -> &[SurfaceLayer] {
        &self.layers
    }

    fn update(&mut self, t: f32) {
        self.transform.position = match &self.orbit {
            Some(orbit) => orbit.position_at(t),
            None => self.base.position,
        };
        self.transform.rotation = match &self.spin {
            Some(spin) => spin.rotation_at(t),
            None => self.base.rotation,
        };
        self.transform.scale = self.base.scale;

        for layer in &mut self.layers {
            let mut local = layer.offset.clone();
            if let Some(spin) = &layer.spin {
                local.rotation = spin.rotation_at(t) * layer.offset.rotation;
            }
            layer.transform = self.transform.compose(&local);
        }
    }
}

/// One entry of the scene's visible sequence.
pub struct VisibleBody<'a> {
    pub index: usize,
    pub transform: &'a Transform,
    pub material: MaterialHandle,
    pub geometry: GeometryHandle,
    pub layer: RenderLayer,
    pub body: &'a Body,
}

/// The ordered collection of drawable bodies.
///
/// Built once from a fixed manifest; the body count does not change during
/// steady-state rendering. The scene is the sole transform mutator and runs
/// single-threadedly ahead of each frame's draw phase.
#[derive(Default)]
pub struct Scene {
    bodies: Vec<Body>,
    elapsed: f32,
    light_anchor: Option<usize>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a body during scene construction; returns its index.
    pub fn add_body(&mut self, body: Body) -> usize {
        self.bodies.push(body);
        self.bodies.len() - 1
    }

    /// Mark the body whose position drives the scene light (the sun).
    pub fn set_light_anchor(&mut self, index: usize) {
        self.light_anchor = Some(index);
    }

    pub fn light_anchor(&self) -> Option<&Body> {
        self.light_anchor.and_then(|i| self.bodies.get(i))
    }

    /// Recompute every transform for absolute scene time `t`.
    ///
    /// Calling this twice with the same `t` yields identical transforms.
    pub fn update(&mut self, t: f32) {
        self.elapsed = t;
        for body in &mut self.bodies {
            body.update(t);
        }
    }

    /// Advance the scene clock by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.update(self.elapsed + dt);
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn body(&self, index: usize) -> &Body {
        &self.bodies[index]
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// The visible sequence in stable draw order: sky first, then opaque
    /// bodies grouped by material (insertion order within a group), then any
    /// blended bodies. Attached layers are expanded later by the frame
    /// planner, after all opaque draws.
    pub fn visible(&self) -> impl Iterator<Item = VisibleBody<'_>> {
        let mut order: Vec<usize> = (0..self.bodies.len()).collect();
        order.sort_by_key(|&i| {
            let body = &self.bodies[i];
            (body.layer, body.material)
        });
        order.into_iter().map(move |index| {
            let body = &self.bodies[index];
            VisibleBody {
                index,
                transform: &body.transform,
                material: body.material,
                geometry: body.geometry,
                layer: body.layer,
                body,
            }
        })
    }
}
