//! Surface shading model catalog.
//!
//! Each celestial body type maps to one shader program; per-body variation
//! lives entirely in uniform parameter bindings, not in code dispatch. Two
//! vertex stages (body, sky) pair with one fragment stage per surface
//! family. The sources ship with the crate and are compiled through the
//! [`ShaderRegistry`] at scene setup.

use crate::error::RenderError;
use crate::registry::{ShaderHandle, ShaderRegistry};

pub const BODY_VERT: &str = include_str!("body.vert.wgsl");
pub const SKY_VERT: &str = include_str!("sky.vert.wgsl");
pub const TERRESTRIAL_FRAG: &str = include_str!("terrestrial.frag.wgsl");
pub const GAS_GIANT_FRAG: &str = include_str!("gas_giant.frag.wgsl");
pub const EARTH_FRAG: &str = include_str!("earth.frag.wgsl");
pub const EMISSIVE_FRAG: &str = include_str!("emissive.frag.wgsl");
pub const CRATERED_FRAG: &str = include_str!("cratered.frag.wgsl");
pub const HULL_FRAG: &str = include_str!("hull.frag.wgsl");
pub const RING_FRAG: &str = include_str!("ring.frag.wgsl");
pub const CLOUD_FRAG: &str = include_str!("cloud.frag.wgsl");
pub const SKY_FRAG: &str = include_str!("sky.frag.wgsl");

/// The fixed set of surface families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Rocky surface blending two layers through a procedural mask.
    Terrestrial,
    /// Banded gas giant; spot and equator band are parameter-gated.
    GasGiant,
    /// Oceans, continents, climate ramps, polar ice.
    EarthLike,
    /// Self-illuminated star surface; ignores the scene light.
    Emissive,
    /// Cratered regolith, diffuse + specular lit.
    Cratered,
    /// Spacecraft hull panels.
    Hull,
    /// Alpha-blended planetary ring disk.
    Ring,
    /// Alpha-blended drifting cloud shell.
    Cloud,
    /// Background starfield.
    Sky,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 9] = [
        SurfaceKind::Terrestrial,
        SurfaceKind::GasGiant,
        SurfaceKind::EarthLike,
        SurfaceKind::Emissive,
        SurfaceKind::Cratered,
        SurfaceKind::Hull,
        SurfaceKind::Ring,
        SurfaceKind::Cloud,
        SurfaceKind::Sky,
    ];

    fn index(self) -> usize {
        match self {
            SurfaceKind::Terrestrial => 0,
            SurfaceKind::GasGiant => 1,
            SurfaceKind::EarthLike => 2,
            SurfaceKind::Emissive => 3,
            SurfaceKind::Cratered => 4,
            SurfaceKind::Hull => 5,
            SurfaceKind::Ring => 6,
            SurfaceKind::Cloud => 7,
            SurfaceKind::Sky => 8,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SurfaceKind::Terrestrial => "terrestrial",
            SurfaceKind::GasGiant => "gas_giant",
            SurfaceKind::EarthLike => "earth",
            SurfaceKind::Emissive => "emissive",
            SurfaceKind::Cratered => "cratered",
            SurfaceKind::Hull => "hull",
            SurfaceKind::Ring => "ring",
            SurfaceKind::Cloud => "cloud",
            SurfaceKind::Sky => "sky",
        }
    }

    /// (vertex, fragment) WGSL sources for this family.
    pub fn sources(self) -> (&'static str, &'static str) {
        match self {
            SurfaceKind::Terrestrial => (BODY_VERT, TERRESTRIAL_FRAG),
            SurfaceKind::GasGiant => (BODY_VERT, GAS_GIANT_FRAG),
            SurfaceKind::EarthLike => (BODY_VERT, EARTH_FRAG),
            SurfaceKind::Emissive => (BODY_VERT, EMISSIVE_FRAG),
            SurfaceKind::Cratered => (BODY_VERT, CRATERED_FRAG),
            SurfaceKind::Hull => (BODY_VERT, HULL_FRAG),
            SurfaceKind::Ring => (BODY_VERT, RING_FRAG),
            SurfaceKind::Cloud => (BODY_VERT, CLOUD_FRAG),
            SurfaceKind::Sky => (SKY_VERT, SKY_FRAG),
        }
    }
}

/// Compiled handles for every surface family.
pub struct SurfaceCatalog {
    handles: [ShaderHandle; SurfaceKind::ALL.len()],
}

impl SurfaceCatalog {
    /// Compile all surface programs. Any failure aborts scene setup — no
    /// scene can render without its materials.
    pub fn compile(registry: &mut ShaderRegistry) -> Result<Self, RenderError> {
        let mut handles = [ShaderHandle(0); SurfaceKind::ALL.len()];
        for (i, kind) in SurfaceKind::ALL.into_iter().enumerate() {
            let (vertex, fragment) = kind.sources();
            handles[i] = registry.compile(kind.name(), vertex, fragment)?;
        }
        Ok(Self { handles })
    }

    pub fn shader(&self, kind: SurfaceKind) -> ShaderHandle {
        self.handles[kind.index()]
    }
}
