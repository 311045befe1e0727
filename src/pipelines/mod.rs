//! Render pipeline construction and GPU material realization.
//!
//! Every pipeline shares the same layout: group 0 material, group 1 frame
//! uniforms, group 2 light. Pipelines are created per (program, surface
//! config) pair, so materials that share both also share the pipeline; the
//! registry's packed uniform blobs and texture bindings become per-material
//! bind groups here. This is the only place registry data meets the device.

pub mod light;

use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        mesh::{MeshVertex, Vertex},
        texture::{Texture, TextureStore, create_default_sampler},
        transform::TransformRaw,
    },
    registry::{
        BlendMode, DepthFn, MaterialHandle, ShaderHandle, ShaderProgram, ShaderRegistry,
        SurfaceConfig, UniformKind,
    },
};

fn blend_state(blend: BlendMode) -> wgpu::BlendState {
    match blend {
        BlendMode::Opaque => wgpu::BlendState {
            alpha: wgpu::BlendComponent::REPLACE,
            color: wgpu::BlendComponent::REPLACE,
        },
        BlendMode::Alpha => wgpu::BlendState::ALPHA_BLENDING,
        BlendMode::Additive => wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent::REPLACE,
        },
    }
}

fn compare_function(depth: DepthFn) -> wgpu::CompareFunction {
    match depth {
        DepthFn::Less => wgpu::CompareFunction::Less,
        DepthFn::LessEqual => wgpu::CompareFunction::LessEqual,
        DepthFn::Always => wgpu::CompareFunction::Always,
    }
}

/// Bind group layout for a program's material group, derived from the
/// reflected interface: one uniform buffer for the params struct plus any
/// texture/sampler globals.
pub fn material_bind_group_layout(
    device: &wgpu::Device,
    program: &ShaderProgram,
) -> wgpu::BindGroupLayout {
    let mut entries: Vec<wgpu::BindGroupLayoutEntry> = Vec::new();
    if program.params_span() > 0 {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: program.params_binding(),
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }
    for slot in program.interface().values() {
        let ty = match slot.kind {
            UniformKind::Texture2d => wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            UniformKind::TextureCube => wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::Cube,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            UniformKind::Sampler => {
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
            }
            _ => continue,
        };
        if entries.iter().any(|e| e.binding == slot.binding) {
            continue;
        }
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: slot.binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty,
            count: None,
        });
    }
    entries.sort_by_key(|e| e.binding);
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some(&format!("{} material_bind_group_layout", program.name())),
    })
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    surface: SurfaceConfig,
    vertex_module: &wgpu::ShaderModule,
    fragment_module: &wgpu::ShaderModule,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex_module,
            entry_point: Some("vs_main"),
            buffers: &[MeshVertex::desc(), TransformRaw::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment_module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(blend_state(surface.blend)),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: surface.cull_backfaces.then_some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: surface.depth_write,
            depth_compare: compare_function(surface.depth_compare),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}

/// A material realized on the GPU: its pipeline index and bind group.
pub struct GpuMaterial {
    pub pipeline: usize,
    pub bind_group: wgpu::BindGroup,
}

/// All pipelines and realized materials for a registry.
///
/// A material whose texture handles cannot be resolved is left unrealized
/// with a warning; the draw path skips it per-entity instead of failing the
/// build.
pub struct PipelineSet {
    pipelines: Vec<wgpu::RenderPipeline>,
    materials: HashMap<MaterialHandle, GpuMaterial>,
}

impl PipelineSet {
    pub fn build(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        registry: &ShaderRegistry,
        textures: &TextureStore,
        frame_layout: &wgpu::BindGroupLayout,
        light_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let mut pipelines = Vec::new();
        let mut pipeline_index: HashMap<(ShaderHandle, SurfaceConfig), usize> = HashMap::new();
        let mut layouts: HashMap<ShaderHandle, wgpu::BindGroupLayout> = HashMap::new();
        let mut modules: HashMap<ShaderHandle, (wgpu::ShaderModule, wgpu::ShaderModule)> =
            HashMap::new();
        let mut materials = HashMap::new();
        let default_sampler = create_default_sampler(device);

        for (handle, material) in registry.materials() {
            let shader = material.shader();
            let program = registry.program(shader);

            let material_layout = layouts
                .entry(shader)
                .or_insert_with(|| material_bind_group_layout(device, program));

            let (vertex_module, fragment_module) = &*modules.entry(shader).or_insert_with(|| {
                let vs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&format!("{} vs", program.name())),
                    source: wgpu::ShaderSource::Wgsl(program.vertex_source().into()),
                });
                let fs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&format!("{} fs", program.name())),
                    source: wgpu::ShaderSource::Wgsl(program.fragment_source().into()),
                });
                (vs, fs)
            });

            let pipeline = match pipeline_index.get(&(shader, material.surface())) {
                Some(&index) => index,
                None => {
                    let layout =
                        device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                            label: Some(&format!("{} Pipeline Layout", program.name())),
                            bind_group_layouts: &[material_layout, frame_layout, light_layout],
                            push_constant_ranges: &[],
                        });
                    let pipeline = mk_render_pipeline(
                        device,
                        &layout,
                        color_format,
                        material.surface(),
                        vertex_module,
                        fragment_module,
                        &format!("{} Pipeline", program.name()),
                    );
                    let index = pipelines.len();
                    pipelines.push(pipeline);
                    pipeline_index.insert((shader, material.surface()), index);
                    index
                }
            };

            // Resolve texture handles; an unresolvable material stays
            // unrealized and its entities are skipped at draw time.
            let mut texture_views = Vec::new();
            let mut missing = false;
            for (binding, texture_handle) in material.textures() {
                match textures.get(*texture_handle) {
                    Some(texture) => texture_views.push((*binding, &texture.view)),
                    None => {
                        let err = crate::error::RenderError::MissingResource {
                            kind: "texture",
                            name: material.name().to_string(),
                        };
                        log::warn!("leaving material `{}` unrealized: {err}", material.name());
                        missing = true;
                    }
                }
            }
            if missing {
                continue;
            }

            let params_buffer = (program.params_span() > 0).then(|| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Params Buffer", material.name())),
                    contents: material.packed_uniforms(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                })
            });

            let mut entries = Vec::new();
            if let Some(buffer) = &params_buffer {
                entries.push(wgpu::BindGroupEntry {
                    binding: program.params_binding(),
                    resource: buffer.as_entire_binding(),
                });
            }
            for (binding, view) in &texture_views {
                entries.push(wgpu::BindGroupEntry {
                    binding: *binding,
                    resource: wgpu::BindingResource::TextureView(view),
                });
            }
            for slot in program.interface().values() {
                if slot.kind == UniformKind::Sampler {
                    entries.push(wgpu::BindGroupEntry {
                        binding: slot.binding,
                        resource: wgpu::BindingResource::Sampler(&default_sampler),
                    });
                }
            }

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                layout: material_layout,
                entries: &entries,
                label: Some(&format!("{} material_bind_group", material.name())),
            });

            materials.insert(
                handle,
                GpuMaterial {
                    pipeline,
                    bind_group,
                },
            );
        }

        Self {
            pipelines,
            materials,
        }
    }

    pub fn pipeline(&self, index: usize) -> &wgpu::RenderPipeline {
        &self.pipelines[index]
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&GpuMaterial> {
        self.materials.get(&handle)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }
}
