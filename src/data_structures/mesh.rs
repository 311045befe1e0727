//! Geometry store: provider-supplied meshes as GPU buffers behind handles.
//!
//! Mesh and texture file parsing is the asset provider's job; the core only
//! accepts decoded vertex/index slices and turns them into GPU buffers. The
//! scene references geometry by [`GeometryHandle`] and never owns it.

use wgpu::util::DeviceExt;

/// Handle to a mesh registered with the [`GeometryStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub u32);

/// Vertex buffer layout descriptor, implemented by every type that lands in
/// a GPU vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// A single mesh vertex: position, texture coordinates, normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl Vertex for MeshVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// A mesh resident on the GPU.
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
}

/// Owns every registered mesh; lookups by handle.
///
/// Out-of-range lookups return `None` rather than panicking so the draw path
/// can skip the entity and keep the frame alive.
#[derive(Default)]
pub struct GeometryStore {
    meshes: Vec<Mesh>,
}

impl GeometryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload a provider-decoded mesh and hand back its handle.
    pub fn register(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        vertices: &[MeshVertex],
        indices: &[u32],
    ) -> GeometryHandle {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Vertex Buffer")),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{name} Index Buffer")),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let handle = GeometryHandle(self.meshes.len() as u32);
        self.meshes.push(Mesh {
            name: name.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
        });
        handle
    }

    pub fn get(&self, handle: GeometryHandle) -> Option<&Mesh> {
        self.meshes.get(handle.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
