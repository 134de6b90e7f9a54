mod context;
mod error;
mod gpu_context;
mod program;
mod trace;

pub use context::{
    OffscreenTarget, Primitive, ProgramId, RenderContext, RenderState, TargetId, TextureId,
    VertexArrayId,
};
pub use error::{Error, Result, ShaderStage};
pub use gpu_context::{GpuContext, DEPTH_FORMAT, OFFSCREEN_FORMAT};
pub use program::{
    attributes, uniforms, ProgramDescriptor, ProgramInterface, UniformBlock, UniformValue,
    FRAGMENT_ENTRY, VERTEX_ENTRY,
};
pub use trace::{Command, TraceContext};
