//! Registry contract tests: compilation, reflection, link checking, and
//! material binding validation. Everything here runs without a GPU — the
//! registry works on WGSL sources and naga IR only.

use std::collections::BTreeMap;

use orrery::error::{RenderError, ShaderStage};
use orrery::registry::{
    ShaderRegistry, SurfaceConfig, UniformKind, UniformValue,
};

const VS: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(position, 1.0);
    out.uv = position.xy;
    return out;
}
"#;

const FS: &str = r#"
struct Params {
    tint: vec4<f32>,
    glow: f32,
}
@group(0) @binding(0) var<uniform> params: Params;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return params.tint * params.glow + vec4<f32>(uv, 0.0, 1.0);
}
"#;

const FS_TEXTURED: &str = r#"
struct Params {
    tint: vec4<f32>,
}
@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var t_base: texture_2d<f32>;
@group(0) @binding(2) var s_base: sampler;

@fragment
fn fs_main(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return textureSample(t_base, s_base, uv) * params.tint;
}
"#;

fn base_bindings() -> BTreeMap<String, UniformValue> {
    let mut bindings = BTreeMap::new();
    bindings.insert("tint".to_string(), UniformValue::Vec4([1.0, 0.5, 0.25, 1.0]));
    bindings.insert("glow".to_string(), UniformValue::F32(2.5));
    bindings
}

#[test]
fn compile_reflects_uniform_interface() {
    let mut registry = ShaderRegistry::new();
    let handle = registry.compile("test", VS, FS).unwrap();

    let program = registry.program(handle);
    let interface = program.interface();
    assert_eq!(interface.len(), 2);
    assert_eq!(interface["tint"].kind, UniformKind::Vec4);
    assert_eq!(interface["glow"].kind, UniformKind::F32);
    // std140-style layout: the vec4 leads, the scalar follows it.
    assert_eq!(interface["tint"].offset, 0);
    assert_eq!(interface["glow"].offset, 16);
    assert!(program.params_span() >= 20);
}

#[test]
fn compile_rejects_bad_vertex_stage() {
    let mut registry = ShaderRegistry::new();
    let result = registry.compile("broken", "not wgsl at all", FS);
    match result {
        Err(RenderError::Compile { stage, diagnostic }) => {
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(!diagnostic.is_empty());
        }
        other => panic!("expected vertex compile error, got {other:?}"),
    }
    assert_eq!(registry.program_count(), 0);
}

#[test]
fn compile_rejects_bad_fragment_stage() {
    let mut registry = ShaderRegistry::new();
    let result = registry.compile("broken", VS, "@fragment fn fs_main( {");
    match result {
        Err(RenderError::Compile { stage, .. }) => assert_eq!(stage, ShaderStage::Fragment),
        other => panic!("expected fragment compile error, got {other:?}"),
    }
    assert_eq!(registry.program_count(), 0);
}

#[test]
fn link_rejects_unfed_fragment_input() {
    // The fragment wants @location(1), which the vertex stage never writes.
    let fs = r#"
@fragment
fn fs_main(@location(1) color: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(color, 1.0);
}
"#;
    let mut registry = ShaderRegistry::new();
    match registry.compile("mismatched", VS, fs) {
        Err(RenderError::Compile { stage, .. }) => assert_eq!(stage, ShaderStage::Link),
        other => panic!("expected link error, got {other:?}"),
    }
}

#[test]
fn link_requires_entry_points() {
    let fs = r#"
@fragment
fn frag(@location(0) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 0.0, 1.0);
}
"#;
    let mut registry = ShaderRegistry::new();
    match registry.compile("no-entry", VS, fs) {
        Err(RenderError::Compile { stage, .. }) => assert_eq!(stage, ShaderStage::Link),
        other => panic!("expected link error, got {other:?}"),
    }
}

#[test]
fn create_material_packs_values_at_reflected_offsets() {
    let mut registry = ShaderRegistry::new();
    let shader = registry.compile("test", VS, FS).unwrap();

    let handle = registry
        .create_material("mat", shader, &base_bindings(), SurfaceConfig::opaque())
        .unwrap();

    let program_span = registry.program(shader).params_span() as usize;
    let glow_offset = registry.program(shader).interface()["glow"].offset as usize;

    let material = registry.material(handle);
    let packed = material.packed_uniforms();
    assert_eq!(packed.len(), program_span);

    let tint: &[f32] = bytemuck::cast_slice(&packed[0..16]);
    assert_eq!(tint, &[1.0, 0.5, 0.25, 1.0]);
    let glow = f32::from_le_bytes(packed[glow_offset..glow_offset + 4].try_into().unwrap());
    assert_eq!(glow, 2.5);
}

#[test]
fn unknown_uniform_leaves_registry_unchanged() {
    let mut registry = ShaderRegistry::new();
    let shader = registry.compile("test", VS, FS).unwrap();

    let mut bindings = base_bindings();
    bindings.insert("glowColor".to_string(), UniformValue::Vec4([1.0; 4]));

    match registry.create_material("bad", shader, &bindings, SurfaceConfig::opaque()) {
        Err(RenderError::UnknownUniform { name, .. }) => assert_eq!(name, "glowColor"),
        other => panic!("expected UnknownUniform, got {other:?}"),
    }
    assert_eq!(registry.material_count(), 0);
}

#[test]
fn any_undeclared_name_is_rejected() {
    let mut registry = ShaderRegistry::new();
    let shader = registry.compile("test", VS, FS).unwrap();

    for wrong in ["Tint", "glw", "params", "tint2", "emissive", "t_base", ""] {
        let mut bindings = base_bindings();
        bindings.insert(wrong.to_string(), UniformValue::F32(1.0));
        assert!(
            matches!(
                registry.create_material("bad", shader, &bindings, SurfaceConfig::opaque()),
                Err(RenderError::UnknownUniform { .. })
            ),
            "binding `{wrong}` should have been rejected"
        );
    }
    assert_eq!(registry.material_count(), 0);
}

#[test]
fn kind_mismatch_is_rejected() {
    let mut registry = ShaderRegistry::new();
    let shader = registry.compile("test", VS, FS).unwrap();

    let mut bindings = base_bindings();
    bindings.insert("tint".to_string(), UniformValue::F32(1.0));

    assert!(matches!(
        registry.create_material("bad", shader, &bindings, SurfaceConfig::opaque()),
        Err(RenderError::UniformTypeMismatch { .. })
    ));
}

#[test]
fn unbound_declared_slot_is_rejected() {
    let mut registry = ShaderRegistry::new();
    let shader = registry.compile("test", VS, FS).unwrap();

    let mut bindings = base_bindings();
    bindings.remove("glow");

    match registry.create_material("partial", shader, &bindings, SurfaceConfig::opaque()) {
        Err(RenderError::UnboundUniform { name, .. }) => assert_eq!(name, "glow"),
        other => panic!("expected UnboundUniform, got {other:?}"),
    }
}

#[test]
fn blended_material_must_not_write_depth() {
    let mut registry = ShaderRegistry::new();
    let shader = registry.compile("test", VS, FS).unwrap();

    let mut surface = SurfaceConfig::blended();
    surface.depth_write = true;

    assert!(matches!(
        registry.create_material("bad", shader, &base_bindings(), surface),
        Err(RenderError::SurfaceConfig { .. })
    ));
    assert_eq!(registry.material_count(), 0);
}

#[test]
fn texture_and_sampler_slots_are_reflected() {
    let mut registry = ShaderRegistry::new();
    let shader = registry.compile("textured", VS, FS_TEXTURED).unwrap();

    let interface = registry.program(shader).interface();
    assert_eq!(interface["t_base"].kind, UniformKind::Texture2d);
    assert_eq!(interface["t_base"].binding, 1);
    assert_eq!(interface["s_base"].kind, UniformKind::Sampler);

    // Samplers are engine-provided: binding only the texture suffices.
    let mut bindings = BTreeMap::new();
    bindings.insert("tint".to_string(), UniformValue::Vec4([1.0; 4]));
    bindings.insert(
        "t_base".to_string(),
        UniformValue::Texture(orrery::registry::TextureHandle(0)),
    );
    let handle = registry
        .create_material("textured", shader, &bindings, SurfaceConfig::opaque())
        .unwrap();
    assert_eq!(registry.material(handle).textures(), &[(1, orrery::registry::TextureHandle(0))]);
}

#[test]
fn surface_catalog_compiles_every_family() {
    let mut registry = ShaderRegistry::new();
    let catalog = orrery::surfaces::SurfaceCatalog::compile(&mut registry).unwrap();
    assert_eq!(registry.program_count(), orrery::surfaces::SurfaceKind::ALL.len());

    // Every lit family shares the light block; the gas giants share one
    // program outright.
    let giant = catalog.shader(orrery::surfaces::SurfaceKind::GasGiant);
    assert_eq!(giant, catalog.shader(orrery::surfaces::SurfaceKind::GasGiant));
}
