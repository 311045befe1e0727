//! Engine data structures: transforms, meshes, textures, and the scene graph.
//!
//! - `transform` holds per-body transformation data and its GPU layout
//! - `mesh` wraps provider-supplied geometry as GPU buffers behind handles
//! - `texture` contains the GPU texture wrapper and the texture store
//! - `scene_graph` is the ordered collection of drawable bodies

pub mod mesh;
pub mod scene_graph;
pub mod texture;
pub mod transform;
