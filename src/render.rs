//! Frame planning and execution.
//!
//! Each frame is planned as pure data first: [`plan_frame`] turns the
//! scene's visible sequence into an ordered [`FramePlan`] — skybox, opaque
//! grouped by material, then blended layers back-to-front — together with a
//! single light snapshot. Planning needs no GPU, which is what makes the
//! pass-ordering and lighting-consistency properties unit-testable.
//! [`execute_plan`] then walks the commands inside one wgpu render pass,
//! skipping redundant pipeline/bind-group rebinds and absorbing missing
//! resources per entity.

use cgmath::{EuclideanSpace, MetricSpace};

use crate::{
    context::Context,
    data_structures::{
        mesh::{GeometryHandle, GeometryStore},
        scene_graph::{RenderLayer, Scene},
        transform::TransformRaw,
    },
    error::RenderError,
    pipelines::{PipelineSet, light::LightUniform},
    registry::MaterialHandle,
};

/// One ordered phase of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Pass {
    Sky,
    Opaque,
    Transparent,
}

/// A single planned draw.
#[derive(Clone, Debug)]
pub struct DrawCommand {
    pub pass: Pass,
    pub material: MaterialHandle,
    pub geometry: GeometryHandle,
    pub transform: TransformRaw,
    /// Distance from the camera, used to sort the transparent pass
    /// back-to-front.
    pub view_depth: f32,
    /// Body or layer name, for per-entity skip logs.
    pub label: String,
}

/// The complete ordered plan for one frame.
pub struct FramePlan {
    commands: Vec<DrawCommand>,
    light: LightUniform,
}

impl FramePlan {
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// The single light snapshot every lit draw of this frame reads.
    pub fn light(&self) -> LightUniform {
        self.light
    }
}

/// Plan a frame from the scene's visible sequence.
///
/// The scene's ordering (sky first, opaque grouped by material) is kept;
/// attached surface layers are appended after all opaque draws and the
/// transparent tail is sorted back-to-front by view depth.
pub fn plan_frame(scene: &Scene, eye: cgmath::Point3<f32>, light: LightUniform) -> FramePlan {
    let mut commands = Vec::with_capacity(scene.len());
    let mut transparent = Vec::new();

    for visible in scene.visible() {
        let pass = match visible.layer {
            RenderLayer::Sky => Pass::Sky,
            RenderLayer::Opaque => Pass::Opaque,
            RenderLayer::Blended => Pass::Transparent,
        };
        let command = DrawCommand {
            pass,
            material: visible.material,
            geometry: visible.geometry,
            transform: visible.transform.to_raw(),
            view_depth: eye.distance(cgmath::Point3::from_vec(visible.transform.position)),
            label: visible.body.name.clone(),
        };
        match pass {
            Pass::Transparent => transparent.push(command),
            _ => commands.push(command),
        }

        for layer in visible.body.layers() {
            transparent.push(DrawCommand {
                pass: Pass::Transparent,
                material: layer.material,
                geometry: layer.geometry,
                transform: layer.transform().to_raw(),
                view_depth: eye.distance(cgmath::Point3::from_vec(layer.transform().position)),
                label: format!("{}/{}", visible.body.name, layer.name),
            });
        }
    }

    transparent.sort_by(|a, b| {
        b.view_depth
            .partial_cmp(&a.view_depth)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    commands.append(&mut transparent);

    FramePlan { commands, light }
}

/// Grows-on-demand pool of per-draw transform buffers.
#[derive(Default)]
pub struct TransformPool {
    buffers: Vec<wgpu::Buffer>,
}

impl TransformPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure(&mut self, device: &wgpu::Device, len: usize) {
        while self.buffers.len() < len {
            self.buffers.push(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Transform Buffer"),
                size: std::mem::size_of::<TransformRaw>() as wgpu::BufferAddress,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
    }
}

/// Execute a frame plan into one render pass.
///
/// The light snapshot and every command transform are uploaded first, then
/// the commands are walked in order. Pipeline and material bind group are
/// rebound only when they change from the previous command — a state-change
/// minimization, not a correctness requirement. A command whose material or
/// geometry cannot be resolved is skipped with a warning and the frame
/// continues.
pub fn execute_plan(
    ctx: &Context,
    pipelines: &PipelineSet,
    geometry: &GeometryStore,
    plan: &FramePlan,
    pool: &mut TransformPool,
    view: &wgpu::TextureView,
    encoder: &mut wgpu::CommandEncoder,
) {
    ctx.queue.write_buffer(
        &ctx.light.buffer,
        0,
        bytemuck::cast_slice(&[plan.light()]),
    );
    pool.ensure(&ctx.device, plan.commands().len());
    for (i, command) in plan.commands().iter().enumerate() {
        ctx.queue
            .write_buffer(&pool.buffers[i], 0, bytemuck::cast_slice(&[command.transform]));
    }

    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("Render Pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(ctx.clear_colour),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &ctx.depth_texture.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        occlusion_query_set: None,
        timestamp_writes: None,
    });

    render_pass.set_bind_group(1, &ctx.frame.bind_group, &[]);
    render_pass.set_bind_group(2, &ctx.light.bind_group, &[]);

    let mut bound_pipeline: Option<usize> = None;
    let mut bound_material: Option<MaterialHandle> = None;

    for (i, command) in plan.commands().iter().enumerate() {
        let Some(material) = pipelines.material(command.material) else {
            let err = RenderError::MissingResource {
                kind: "material",
                name: command.label.clone(),
            };
            log::warn!("skipping draw: {err}");
            continue;
        };
        let Some(mesh) = geometry.get(command.geometry) else {
            let err = RenderError::MissingResource {
                kind: "geometry",
                name: command.label.clone(),
            };
            log::warn!("skipping draw: {err}");
            continue;
        };

        if bound_pipeline != Some(material.pipeline) {
            render_pass.set_pipeline(pipelines.pipeline(material.pipeline));
            bound_pipeline = Some(material.pipeline);
        }
        if bound_material != Some(command.material) {
            render_pass.set_bind_group(0, &material.bind_group, &[]);
            bound_material = Some(command.material);
        }

        render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, pool.buffers[i].slice(..));
        render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }
}
