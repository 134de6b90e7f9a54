use std::fmt;

use thiserror::Error;

/// Shader stage that failed while building a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Link,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Link => "link",
        };
        f.write_str(name)
    }
}

/// Errors raised by the render context, scene and shapes.
///
/// None of these are recoverable at the point they occur: a failure during
/// setup keeps the scene from ever rendering, a failure during a redraw
/// aborts that frame.
#[derive(Debug, Error)]
pub enum Error {
    #[error("rendering context unavailable: {0}")]
    ContextCreation(String),

    #[error("program `{label}` failed at {stage} stage:\n{log}")]
    ProgramCompile {
        label: String,
        stage: ShaderStage,
        log: String,
    },

    #[error("cannot find attribute `{name}` in program `{program}`")]
    AttributeNotFound { program: String, name: String },

    #[error("unable to find uniform `{name}` in program `{program}`")]
    UniformNotFound { program: String, name: String },

    #[error("uniform `{name}` expects a {expected} value")]
    UniformType { name: String, expected: &'static str },

    #[error("no program is bound")]
    NoProgramBound,

    #[error("no vertex array is bound")]
    NoVertexArrayBound,

    #[error("no render target is bound")]
    NoTargetBound,

    #[error("vertex buffer of {len} floats is not a multiple of {multiple}")]
    InvalidVertexData { len: usize, multiple: usize },

    #[error("depth range {depth} must exceed the near plane")]
    InvalidDepthRange { depth: f32 },

    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_carries_log() {
        let err = Error::ProgramCompile {
            label: "letter".to_string(),
            stage: ShaderStage::Fragment,
            log: "expected `;`".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("letter"));
        assert!(message.contains("fragment stage"));
        assert!(message.contains("expected `;`"));
    }

    #[test]
    fn test_uniform_not_found_names_program() {
        let err = Error::UniformNotFound {
            program: "point".to_string(),
            name: "u_world".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unable to find uniform `u_world` in program `point`"
        );
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ShaderStage::Vertex.to_string(), "vertex");
        assert_eq!(ShaderStage::Link.to_string(), "link");
    }
}
