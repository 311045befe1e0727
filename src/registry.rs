//! Shader and material registry.
//!
//! The registry owns every compiled shader program and every material built
//! on top of one. Compilation runs the WGSL sources through naga
//! (parse, validate, cross-stage link check) and reflects the material
//! uniform interface out of the IR, so the whole contract — including the
//! "no draw may see an unbound uniform" invariant — is enforced here at
//! creation time and never deferred to the draw path. None of this needs a
//! live GPU device; pipeline and bind-group realization happens later in
//! [`crate::pipelines`].
//!
//! Bind group convention (shared by every pipeline in the crate):
//! - group 0: material — one uniform params struct plus optional
//!   texture/sampler globals. Validated against material bindings.
//! - group 1: per-frame uniforms (view/projection, camera position, time).
//! - group 2: the light block.
//!
//! Groups 1 and 2 are engine-owned and excluded from the material contract.

use std::collections::BTreeMap;

use crate::error::{RenderError, ShaderStage};

/// Handle to a compiled shader program owned by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderHandle(pub u16);

/// Handle to a material owned by the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialHandle(pub u16);

/// Handle to a texture registered with the [`crate::data_structures::texture::TextureStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Semantic type of a uniform slot, reflected from the shader IR.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformKind {
    F32,
    U32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Texture2d,
    TextureCube,
    Sampler,
}

impl std::fmt::Display for UniformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UniformKind::F32 => "f32",
            UniformKind::U32 => "u32",
            UniformKind::Vec2 => "vec2<f32>",
            UniformKind::Vec3 => "vec3<f32>",
            UniformKind::Vec4 => "vec4<f32>",
            UniformKind::Mat4 => "mat4x4<f32>",
            UniformKind::Texture2d => "texture_2d<f32>",
            UniformKind::TextureCube => "texture_cube<f32>",
            UniformKind::Sampler => "sampler",
        };
        f.write_str(s)
    }
}

/// One named slot in a shader's material interface.
///
/// Data slots (scalar/vector/matrix) are members of the material uniform
/// struct and carry their byte offset within it; texture and sampler slots
/// are standalone globals and carry their `@binding` index instead.
#[derive(Clone, Copy, Debug)]
pub struct UniformSlot {
    pub kind: UniformKind,
    pub binding: u32,
    pub offset: u32,
}

/// A concrete value bound to a uniform slot by a material.
#[derive(Clone, Copy, Debug)]
pub enum UniformValue {
    F32(f32),
    U32(u32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([[f32; 4]; 4]),
    Texture(TextureHandle),
}

impl UniformValue {
    fn kind(&self) -> UniformKind {
        match self {
            UniformValue::F32(_) => UniformKind::F32,
            UniformValue::U32(_) => UniformKind::U32,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
            // A texture handle satisfies either image dimensionality; the
            // store resolves the actual view at realization.
            UniformValue::Texture(_) => UniformKind::Texture2d,
        }
    }

    fn matches(&self, kind: UniformKind) -> bool {
        match (self, kind) {
            (UniformValue::Texture(_), UniformKind::Texture2d | UniformKind::TextureCube) => true,
            _ => self.kind() == kind,
        }
    }

    fn write(&self, out: &mut [u8], offset: usize) {
        match self {
            UniformValue::F32(v) => out[offset..offset + 4].copy_from_slice(&v.to_le_bytes()),
            UniformValue::U32(v) => out[offset..offset + 4].copy_from_slice(&v.to_le_bytes()),
            UniformValue::Vec2(v) => {
                out[offset..offset + 8].copy_from_slice(bytemuck::cast_slice(v))
            }
            UniformValue::Vec3(v) => {
                out[offset..offset + 12].copy_from_slice(bytemuck::cast_slice(v))
            }
            UniformValue::Vec4(v) => {
                out[offset..offset + 16].copy_from_slice(bytemuck::cast_slice(v))
            }
            UniformValue::Mat4(v) => {
                for (col, values) in v.iter().enumerate() {
                    let at = offset + col * 16;
                    out[at..at + 16].copy_from_slice(bytemuck::cast_slice(values));
                }
            }
            UniformValue::Texture(_) => (),
        }
    }
}

/// How a material blends into the colour target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendMode {
    Opaque,
    Alpha,
    Additive,
}

/// Depth comparison for a material's pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DepthFn {
    Less,
    LessEqual,
    Always,
}

/// Blend/depth-test configuration carried by a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceConfig {
    pub blend: BlendMode,
    pub depth_write: bool,
    pub depth_compare: DepthFn,
    pub cull_backfaces: bool,
}

impl SurfaceConfig {
    /// Standard opaque geometry: depth tested and written.
    pub fn opaque() -> Self {
        Self {
            blend: BlendMode::Opaque,
            depth_write: true,
            depth_compare: DepthFn::Less,
            cull_backfaces: true,
        }
    }

    /// Alpha-blended layers (rings, clouds): tested against depth but never
    /// writing it, so they composite over opaque geometry.
    pub fn blended() -> Self {
        Self {
            blend: BlendMode::Alpha,
            depth_write: false,
            depth_compare: DepthFn::Less,
            cull_backfaces: false,
        }
    }

    /// Skybox: drawn at the far plane, must never occlude scene geometry.
    pub fn sky() -> Self {
        Self {
            blend: BlendMode::Opaque,
            depth_write: false,
            depth_compare: DepthFn::LessEqual,
            cull_backfaces: false,
        }
    }

    fn validate(&self) -> Result<(), RenderError> {
        if self.blend != BlendMode::Opaque && self.depth_write {
            return Err(RenderError::SurfaceConfig {
                reason: "blended surfaces must not write depth".into(),
            });
        }
        if self.depth_compare == DepthFn::Always && self.depth_write {
            return Err(RenderError::SurfaceConfig {
                reason: "depth_compare Always combined with depth writes".into(),
            });
        }
        Ok(())
    }
}

/// A compiled and reflected shader program.
///
/// Stores the validated WGSL sources (wgpu modules are created from them at
/// pipeline-build time) and the reflected material interface.
pub struct ShaderProgram {
    name: String,
    vertex_source: String,
    fragment_source: String,
    interface: BTreeMap<String, UniformSlot>,
    /// Byte size of the group-0 uniform params struct; 0 when the program
    /// takes no data parameters.
    params_span: u32,
    /// `@binding` index of the params struct within group 0.
    params_binding: u32,
}

impl ShaderProgram {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }

    /// The reflected material interface: uniform name → slot.
    pub fn interface(&self) -> &BTreeMap<String, UniformSlot> {
        &self.interface
    }

    pub fn params_span(&self) -> u32 {
        self.params_span
    }

    pub fn params_binding(&self) -> u32 {
        self.params_binding
    }
}

/// A material: a shader program plus concrete parameter values and
/// blend/depth configuration.
pub struct Material {
    name: String,
    shader: ShaderHandle,
    surface: SurfaceConfig,
    packed: Vec<u8>,
    textures: Vec<(u32, TextureHandle)>,
}

impl Material {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    pub fn surface(&self) -> SurfaceConfig {
        self.surface
    }

    /// Parameter values packed at the reflected struct offsets, ready for a
    /// uniform buffer upload.
    pub fn packed_uniforms(&self) -> &[u8] {
        &self.packed
    }

    /// Texture bindings as (group-0 binding index, handle) pairs.
    pub fn textures(&self) -> &[(u32, TextureHandle)] {
        &self.textures
    }
}

/// Owner of all compiled shader programs and materials.
///
/// Handles stay valid until the registry is dropped; programs and materials
/// are immutable once registered. Dropping the registry releases materials
/// before programs (field order), matching reverse creation order.
#[derive(Default)]
pub struct ShaderRegistry {
    materials: Vec<Material>,
    programs: Vec<ShaderProgram>,
}

impl ShaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile and link a vertex/fragment WGSL source pair.
    ///
    /// Both stages are parsed and validated with naga, the `vs_main` /
    /// `fs_main` entry points are checked, and every fragment input location
    /// must be produced by a vertex output. On any failure nothing is
    /// registered and the diagnostic is carried in the error.
    pub fn compile(
        &mut self,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, RenderError> {
        let vertex = parse_and_validate(vertex_source, ShaderStage::Vertex)?;
        let fragment = parse_and_validate(fragment_source, ShaderStage::Fragment)?;

        let vs_entry = entry_point(&vertex, "vs_main", naga::ShaderStage::Vertex)
            .ok_or_else(|| link_error("vertex stage has no `vs_main` entry point"))?;
        let fs_entry = entry_point(&fragment, "fs_main", naga::ShaderStage::Fragment)
            .ok_or_else(|| link_error("fragment stage has no `fs_main` entry point"))?;

        let outputs = result_locations(&vertex, vs_entry);
        for location in argument_locations(&fragment, fs_entry) {
            if !outputs.contains(&location) {
                return Err(link_error(&format!(
                    "fragment input @location({location}) has no matching vertex output"
                )));
            }
        }

        let mut interface = BTreeMap::new();
        let mut params = None;
        for module in [&vertex, &fragment] {
            reflect_material_group(module, &mut interface, &mut params)?;
        }
        let (params_span, params_binding) = params.unwrap_or((0, 0));

        let handle = ShaderHandle(self.programs.len() as u16);
        self.programs.push(ShaderProgram {
            name: name.to_string(),
            vertex_source: vertex_source.to_string(),
            fragment_source: fragment_source.to_string(),
            interface,
            params_span,
            params_binding,
        });
        log::info!("compiled shader program `{name}`");
        Ok(handle)
    }

    /// Create a material from a program, a set of uniform bindings, and a
    /// surface configuration.
    ///
    /// Every binding name must be declared by the shader with a matching
    /// kind, and every declared data/texture slot must be bound (samplers
    /// are engine-provided and exempt). Validation failures leave the
    /// registry unchanged.
    pub fn create_material(
        &mut self,
        name: &str,
        shader: ShaderHandle,
        bindings: &BTreeMap<String, UniformValue>,
        surface: SurfaceConfig,
    ) -> Result<MaterialHandle, RenderError> {
        surface.validate()?;
        let program = &self.programs[shader.0 as usize];

        for (bound_name, value) in bindings {
            let slot = program.interface.get(bound_name).ok_or_else(|| {
                RenderError::UnknownUniform {
                    name: bound_name.clone(),
                    shader: program.name.clone(),
                }
            })?;
            if !value.matches(slot.kind) {
                return Err(RenderError::UniformTypeMismatch {
                    name: bound_name.clone(),
                    expected: slot.kind.to_string(),
                    bound: value.kind().to_string(),
                });
            }
        }
        for (declared, slot) in &program.interface {
            if slot.kind == UniformKind::Sampler {
                continue;
            }
            if !bindings.contains_key(declared) {
                return Err(RenderError::UnboundUniform {
                    name: declared.clone(),
                    shader: program.name.clone(),
                });
            }
        }

        let mut packed = vec![0u8; program.params_span as usize];
        let mut textures = Vec::new();
        for (bound_name, value) in bindings {
            let slot = program.interface[bound_name];
            match value {
                UniformValue::Texture(handle) => textures.push((slot.binding, *handle)),
                data => data.write(&mut packed, slot.offset as usize),
            }
        }
        textures.sort_by_key(|(binding, _)| *binding);

        let handle = MaterialHandle(self.materials.len() as u16);
        self.materials.push(Material {
            name: name.to_string(),
            shader,
            surface,
            packed,
            textures,
        });
        Ok(handle)
    }

    pub fn program(&self, handle: ShaderHandle) -> &ShaderProgram {
        &self.programs[handle.0 as usize]
    }

    pub fn material(&self, handle: MaterialHandle) -> &Material {
        &self.materials[handle.0 as usize]
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> {
        self.materials
            .iter()
            .enumerate()
            .map(|(i, m)| (MaterialHandle(i as u16), m))
    }
}

fn link_error(diagnostic: &str) -> RenderError {
    RenderError::Compile {
        stage: ShaderStage::Link,
        diagnostic: diagnostic.to_string(),
    }
}

fn parse_and_validate(source: &str, stage: ShaderStage) -> Result<naga::Module, RenderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| RenderError::Compile {
        stage,
        diagnostic: e.emit_to_string(source),
    })?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| RenderError::Compile {
        stage,
        diagnostic: e.emit_to_string(source),
    })?;
    Ok(module)
}

fn entry_point<'m>(
    module: &'m naga::Module,
    name: &str,
    stage: naga::ShaderStage,
) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.name == name && ep.stage == stage)
}

/// Collect the `@location` indices a type binds, flattening IO structs.
fn binding_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<u32>,
) {
    if let Some(naga::Binding::Location { location, .. }) = binding {
        out.push(*location);
        return;
    }
    if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
        for member in members {
            if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                out.push(*location);
            }
        }
    }
}

fn result_locations(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<u32> {
    let mut out = Vec::new();
    if let Some(result) = &entry.function.result {
        binding_locations(module, result.ty, result.binding.as_ref(), &mut out);
    }
    out
}

fn argument_locations(module: &naga::Module, entry: &naga::EntryPoint) -> Vec<u32> {
    let mut out = Vec::new();
    for arg in &entry.function.arguments {
        binding_locations(module, arg.ty, arg.binding.as_ref(), &mut out);
    }
    out
}

/// Reflect a module's group-0 globals into the material interface map.
///
/// The uniform params struct contributes its members as named data slots at
/// their layout offsets; texture/sampler globals contribute their own names.
fn reflect_material_group(
    module: &naga::Module,
    interface: &mut BTreeMap<String, UniformSlot>,
    params: &mut Option<(u32, u32)>,
) -> Result<(), RenderError> {
    for (_, var) in module.global_variables.iter() {
        let Some(resource) = &var.binding else {
            continue;
        };
        if resource.group != 0 {
            continue;
        }
        let ty = &module.types[var.ty];
        match (&var.space, &ty.inner) {
            (naga::AddressSpace::Uniform, naga::TypeInner::Struct { members, span }) => {
                if let Some((_, existing)) = params {
                    if *existing != resource.binding {
                        return Err(link_error(
                            "multiple material uniform structs declared in group 0",
                        ));
                    }
                }
                *params = Some((*span, resource.binding));
                for member in members {
                    let Some(member_name) = &member.name else {
                        continue;
                    };
                    let kind = data_kind(module, member.ty).ok_or_else(|| {
                        link_error(&format!(
                            "material uniform `{member_name}` has an unsupported type"
                        ))
                    })?;
                    insert_slot(
                        interface,
                        member_name,
                        UniformSlot {
                            kind,
                            binding: resource.binding,
                            offset: member.offset,
                        },
                    )?;
                }
            }
            (naga::AddressSpace::Handle, inner) => {
                let Some(var_name) = &var.name else { continue };
                let kind = match inner {
                    naga::TypeInner::Image {
                        dim: naga::ImageDimension::Cube,
                        ..
                    } => UniformKind::TextureCube,
                    naga::TypeInner::Image { .. } => UniformKind::Texture2d,
                    naga::TypeInner::Sampler { .. } => UniformKind::Sampler,
                    _ => continue,
                };
                insert_slot(
                    interface,
                    var_name,
                    UniformSlot {
                        kind,
                        binding: resource.binding,
                        offset: 0,
                    },
                )?;
            }
            _ => (),
        }
    }
    Ok(())
}

fn insert_slot(
    interface: &mut BTreeMap<String, UniformSlot>,
    name: &str,
    slot: UniformSlot,
) -> Result<(), RenderError> {
    if let Some(existing) = interface.get(name) {
        if existing.kind != slot.kind {
            return Err(link_error(&format!(
                "uniform `{name}` declared with conflicting types across stages"
            )));
        }
        return Ok(());
    }
    interface.insert(name.to_string(), slot);
    Ok(())
}

fn data_kind(module: &naga::Module, ty: naga::Handle<naga::Type>) -> Option<UniformKind> {
    match &module.types[ty].inner {
        naga::TypeInner::Scalar(scalar) => match scalar.kind {
            naga::ScalarKind::Float => Some(UniformKind::F32),
            naga::ScalarKind::Uint => Some(UniformKind::U32),
            _ => None,
        },
        naga::TypeInner::Vector { size, .. } => match size {
            naga::VectorSize::Bi => Some(UniformKind::Vec2),
            naga::VectorSize::Tri => Some(UniformKind::Vec3),
            naga::VectorSize::Quad => Some(UniformKind::Vec4),
        },
        naga::TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            ..
        } => Some(UniformKind::Mat4),
        _ => None,
    }
}
