use super::error::Result;
use super::program::{ProgramDescriptor, UniformValue};

/// Compiled program handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Vertex array handle: the set of attribute buffers a shape draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

/// Sampleable texture handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Off-screen render target handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u32);

/// How consecutive vertices are assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Triangles,
    Points,
}

/// Persistent fixed-function state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderState {
    pub depth_test: bool,
    pub cull_back_faces: bool,
}

impl RenderState {
    /// Depth testing and back-face culling, as every scene uses
    pub const SCENE: RenderState = RenderState {
        depth_test: true,
        cull_back_faces: true,
    };
}

/// Color + depth render target with its color attachment exposed as a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenTarget {
    pub target: TargetId,
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Immediate-mode graphics state shared by scene and shapes.
///
/// Bindings (`bind_target`, `use_program`, `bind_vertex_array`) are global to
/// the context. Callers that bind something restore the unbound state before
/// returning so operations compose without leaking state.
pub trait RenderContext {
    /// Set depth testing and face culling for programs compiled afterwards
    fn set_render_state(&mut self, state: RenderState);

    /// Compile and link a program from its two stages
    fn compile_program(&mut self, descriptor: &ProgramDescriptor) -> Result<ProgramId>;

    fn create_vertex_array(&mut self) -> VertexArrayId;

    /// Upload three floats per vertex for `attribute` of `program` into `vertex_array`
    fn buffer_attribute(
        &mut self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        attribute: &str,
        data: &[f32],
    ) -> Result<()>;

    /// Allocate a color + depth target; nearest filtering, edge clamped
    fn create_offscreen_target(&mut self, width: u32, height: u32) -> Result<OffscreenTarget>;

    fn release_offscreen_target(&mut self, target: &OffscreenTarget) -> Result<()>;

    /// Bind `target`, or the default surface when `None`
    fn bind_target(&mut self, target: Option<TargetId>) -> Result<()>;

    /// Clear color and depth of the bound target
    fn clear(&mut self, color: [f64; 4]) -> Result<()>;

    /// Finish drawing into the bound target and return to the unbound state
    fn unbind_target(&mut self) -> Result<()>;

    fn use_program(&mut self, program: Option<ProgramId>);

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>);

    /// Push `value` into uniform `name` of the bound program
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<()>;

    /// Bind `texture` to sampler `name` of the bound program
    fn bind_texture(&mut self, name: &str, texture: TextureId) -> Result<()>;

    /// Draw `vertex_count` vertices from the bound vertex array
    fn draw_arrays(&mut self, primitive: Primitive, vertex_count: u32) -> Result<()>;
}
