//! Camera input and per-frame uniform state.
//!
//! The camera is external input: the host's controller supplies view and
//! projection each frame and the core folds them — together with the scene
//! clock — into a single per-frame uniform block bound at group 1 by every
//! pipeline. A translation-stripped view-projection is included for the
//! skybox pass.

use cgmath::SquareMatrix;
use wgpu::util::DeviceExt;

/// cgmath produces OpenGL clip space (z in -1..1); wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Per-frame camera input: view and projection matrices plus the eye
/// position, supplied by the external camera controller.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub view: cgmath::Matrix4<f32>,
    pub proj: cgmath::Matrix4<f32>,
    pub eye: cgmath::Point3<f32>,
}

impl Camera {
    /// Convenience constructor for hosts without their own matrix math.
    pub fn look_at(
        eye: cgmath::Point3<f32>,
        target: cgmath::Point3<f32>,
        aspect: f32,
        fovy: cgmath::Deg<f32>,
        znear: f32,
        zfar: f32,
    ) -> Self {
        let view = cgmath::Matrix4::look_at_rh(eye, target, cgmath::Vector3::unit_y());
        let proj = OPENGL_TO_WGPU_MATRIX * cgmath::perspective(fovy, aspect, znear, zfar);
        Self { view, proj, eye }
    }

    pub fn view_proj(&self) -> cgmath::Matrix4<f32> {
        self.proj * self.view
    }

    /// View-projection with the view translation removed, so the skybox
    /// stays centred on the camera.
    pub fn sky_view_proj(&self) -> cgmath::Matrix4<f32> {
        let mut view = self.view;
        view.w = cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        self.proj * view
    }
}

/// The group-1 uniform block: view-projection, sky view-projection, eye
/// position, and scene time. One buffer, written once per frame — the
/// single source of per-frame global state for every shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    sky_view_proj: [[f32; 4]; 4],
    view_pos: [f32; 4],
    time: [f32; 4],
}

impl FrameUniform {
    pub fn new() -> Self {
        Self {
            view_proj: cgmath::Matrix4::identity().into(),
            sky_view_proj: cgmath::Matrix4::identity().into(),
            view_pos: [0.0; 4],
            time: [0.0; 4],
        }
    }

    pub fn update(&mut self, camera: &Camera, time_seconds: f32) {
        self.view_proj = camera.view_proj().into();
        self.sky_view_proj = camera.sky_view_proj().into();
        self.view_pos = [camera.eye.x, camera.eye.y, camera.eye.z, 1.0];
        self.time = [time_seconds, 0.0, 0.0, 0.0];
    }
}

impl Default for FrameUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU-side resources for the frame uniform block.
#[derive(Debug)]
pub struct FrameResources {
    pub uniform: FrameUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("frame_bind_group_layout"),
    })
}

impl FrameResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = FrameUniform::new();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("frame_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Push the current uniform values to the GPU.
    pub fn write(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
