//! Error taxonomy for the rendering core.
//!
//! Configuration-time errors (shader compilation, material binding
//! validation) are fatal and surfaced immediately; per-frame errors
//! ([`RenderError::MissingResource`]) are absorbed by the frame loop, which
//! skips the affected entity and logs instead of aborting the frame.

use thiserror::Error;

/// The shader stage a compile failure was detected in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    /// Cross-stage validation: the vertex outputs don't cover the fragment
    /// inputs, or a required entry point is missing.
    Link,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
            ShaderStage::Link => f.write_str("link"),
        }
    }
}

/// Errors produced by the registry, scene setup, and the draw path.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A shader stage failed to parse, validate, or link. Fatal at startup.
    #[error("{stage} stage failed to compile: {diagnostic}")]
    Compile {
        stage: ShaderStage,
        diagnostic: String,
    },

    /// A material binds a uniform name the shader does not declare.
    #[error("material binds uniform `{name}` which shader `{shader}` does not declare")]
    UnknownUniform { name: String, shader: String },

    /// A material binds a value whose kind does not match the declaration.
    #[error("uniform `{name}` expects {expected} but the material binds {bound}")]
    UniformTypeMismatch {
        name: String,
        expected: String,
        bound: String,
    },

    /// A uniform slot declared by the shader's material group was left
    /// unbound. Rejected at creation so a draw can never read undefined
    /// uniform state.
    #[error("uniform `{name}` declared by shader `{shader}` is not bound by the material")]
    UnboundUniform { name: String, shader: String },

    /// The material's blend/depth configuration is invalid.
    #[error("invalid surface configuration: {reason}")]
    SurfaceConfig { reason: String },

    /// A geometry or texture handle was absent at draw time. Recoverable:
    /// the entity is skipped and the frame continues.
    #[error("missing {kind} resource `{name}`")]
    MissingResource { kind: &'static str, name: String },
}
