//! orrery
//!
//! A real-time solar-system renderer with a procedural surface-shader
//! pipeline. The crate is a rendering core: it owns shader compilation and
//! the material uniform contract, the scene graph of drawable bodies, the
//! shared lighting model, and the per-frame pass orchestration. Asset
//! loading, windowing, and camera control are external collaborators that
//! hand in geometry/texture data and a camera each frame.
//!
//! High-level modules
//! - `camera`: external camera input and the per-frame uniform block
//! - `context`: central GPU context that owns device/queue/surface
//! - `data_structures`: transforms, meshes, textures, and the scene graph
//! - `error`: the error taxonomy shared across the crate
//! - `frame`: the winit-driven frame loop and the provider trait
//! - `pipelines`: pipeline construction and GPU material realization
//! - `registry`: shader compilation, reflection, and material validation
//! - `render`: pure frame planning and plan execution
//! - `solar`: the fixed solar-system manifest
//! - `surfaces`: the procedural surface shading model catalog
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod frame;
pub mod pipelines;
pub mod registry;
pub mod render;
pub mod solar;
pub mod surfaces;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::event::WindowEvent;
