use log::trace;

use super::context::{
    OffscreenTarget, Primitive, ProgramId, RenderContext, RenderState, TargetId, TextureId,
    VertexArrayId,
};
use super::error::{Error, Result};
use super::program::{ProgramDescriptor, ProgramInterface, UniformBlock, UniformValue};

/// One call made against a [`TraceContext`]
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetRenderState(RenderState),
    CompileProgram {
        program: ProgramId,
        label: String,
    },
    CreateVertexArray(VertexArrayId),
    BufferAttribute {
        program: ProgramId,
        vertex_array: VertexArrayId,
        attribute: String,
        vertex_count: usize,
    },
    CreateTarget(OffscreenTarget),
    ReleaseTarget(TargetId),
    BindTarget(Option<TargetId>),
    Clear([f64; 4]),
    UnbindTarget,
    UseProgram(Option<ProgramId>),
    BindVertexArray(Option<VertexArrayId>),
    SetUniform {
        program: ProgramId,
        name: String,
        value: UniformValue,
    },
    BindTexture {
        program: ProgramId,
        name: String,
        texture: TextureId,
    },
    Draw {
        program: ProgramId,
        vertex_array: VertexArrayId,
        target: Option<TargetId>,
        primitive: Primitive,
        vertex_count: u32,
    },
}

struct TraceProgram {
    label: String,
    interface: ProgramInterface,
    uniforms: UniformBlock,
    textures: Vec<(String, TextureId)>,
}

#[derive(Default)]
struct TraceVertexArray {
    attributes: Vec<String>,
}

/// Headless render context that validates the context contract and records
/// every call.
///
/// Used by the `--headless` mode and by tests that need to observe what a
/// shape or pass pushed into the programs.
#[derive(Default)]
pub struct TraceContext {
    commands: Vec<Command>,
    render_state: RenderState,
    programs: Vec<TraceProgram>,
    vertex_arrays: Vec<TraceVertexArray>,
    targets: Vec<Option<OffscreenTarget>>,
    next_texture: u32,
    bound_target: Option<Option<TargetId>>,
    current_program: Option<ProgramId>,
    current_vertex_array: Option<VertexArrayId>,
}

impl TraceContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Drain recorded commands, keeping all state
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    /// Current uniform values of `program`
    pub fn uniforms(&self, program: ProgramId) -> Option<&UniformBlock> {
        self.programs.get(program.0 as usize).map(|p| &p.uniforms)
    }

    pub fn bound_texture(&self, program: ProgramId, name: &str) -> Option<TextureId> {
        self.programs.get(program.0 as usize).and_then(|p| {
            p.textures
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, texture)| *texture)
        })
    }

    pub fn program_label(&self, program: ProgramId) -> Option<&str> {
        self.programs
            .get(program.0 as usize)
            .map(|p| p.label.as_str())
    }

    /// True when no target, program or vertex array is bound
    pub fn is_unbound(&self) -> bool {
        self.bound_target.is_none()
            && self.current_program.is_none()
            && self.current_vertex_array.is_none()
    }

    /// Number of draw calls recorded so far
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::Draw { .. }))
            .count()
    }

    fn record(&mut self, command: Command) {
        trace!("{:?}", command);
        self.commands.push(command);
    }

    fn program(&self, program: ProgramId) -> Result<&TraceProgram> {
        self.programs
            .get(program.0 as usize)
            .ok_or(Error::UnknownHandle {
                kind: "program",
                id: program.0,
            })
    }

    fn bound_program(&mut self) -> Result<(ProgramId, &mut TraceProgram)> {
        let id = self.current_program.ok_or(Error::NoProgramBound)?;
        let program = self
            .programs
            .get_mut(id.0 as usize)
            .ok_or(Error::UnknownHandle {
                kind: "program",
                id: id.0,
            })?;
        Ok((id, program))
    }

    fn live_target(&self, target: TargetId) -> Result<&OffscreenTarget> {
        self.targets
            .get(target.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownHandle {
                kind: "target",
                id: target.0,
            })
    }
}

impl RenderContext for TraceContext {
    fn set_render_state(&mut self, state: RenderState) {
        self.render_state = state;
        self.record(Command::SetRenderState(state));
    }

    fn compile_program(&mut self, descriptor: &ProgramDescriptor) -> Result<ProgramId> {
        descriptor.validate()?;

        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(TraceProgram {
            label: descriptor.label.clone(),
            interface: descriptor.interface.clone(),
            uniforms: UniformBlock::default(),
            textures: Vec::new(),
        });
        self.record(Command::CompileProgram {
            program: id,
            label: descriptor.label.clone(),
        });
        Ok(id)
    }

    fn create_vertex_array(&mut self) -> VertexArrayId {
        let id = VertexArrayId(self.vertex_arrays.len() as u32);
        self.vertex_arrays.push(TraceVertexArray::default());
        self.record(Command::CreateVertexArray(id));
        id
    }

    fn buffer_attribute(
        &mut self,
        program: ProgramId,
        vertex_array: VertexArrayId,
        attribute: &str,
        data: &[f32],
    ) -> Result<()> {
        let declared = self.program(program)?;
        if !declared.interface.has_attribute(attribute) {
            return Err(Error::AttributeNotFound {
                program: declared.label.clone(),
                name: attribute.to_string(),
            });
        }

        let array = self
            .vertex_arrays
            .get_mut(vertex_array.0 as usize)
            .ok_or(Error::UnknownHandle {
                kind: "vertex array",
                id: vertex_array.0,
            })?;
        if !array.attributes.iter().any(|a| a == attribute) {
            array.attributes.push(attribute.to_string());
        }

        self.record(Command::BufferAttribute {
            program,
            vertex_array,
            attribute: attribute.to_string(),
            vertex_count: data.len() / 3,
        });
        Ok(())
    }

    fn create_offscreen_target(&mut self, width: u32, height: u32) -> Result<OffscreenTarget> {
        let target = OffscreenTarget {
            target: TargetId(self.targets.len() as u32),
            texture: TextureId(self.next_texture),
            width,
            height,
        };
        self.next_texture += 1;
        self.targets.push(Some(target));
        self.record(Command::CreateTarget(target));
        Ok(target)
    }

    fn release_offscreen_target(&mut self, target: &OffscreenTarget) -> Result<()> {
        self.live_target(target.target)?;
        self.targets[target.target.0 as usize] = None;
        self.record(Command::ReleaseTarget(target.target));
        Ok(())
    }

    fn bind_target(&mut self, target: Option<TargetId>) -> Result<()> {
        if let Some(id) = target {
            self.live_target(id)?;
        }
        self.bound_target = Some(target);
        self.record(Command::BindTarget(target));
        Ok(())
    }

    fn clear(&mut self, color: [f64; 4]) -> Result<()> {
        if self.bound_target.is_none() {
            return Err(Error::NoTargetBound);
        }
        self.record(Command::Clear(color));
        Ok(())
    }

    fn unbind_target(&mut self) -> Result<()> {
        if self.bound_target.take().is_none() {
            return Err(Error::NoTargetBound);
        }
        self.record(Command::UnbindTarget);
        Ok(())
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.current_program = program;
        self.record(Command::UseProgram(program));
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        self.current_vertex_array = vertex_array;
        self.record(Command::BindVertexArray(vertex_array));
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let (id, program) = self.bound_program()?;
        if !program.interface.has_uniform(name) {
            return Err(Error::UniformNotFound {
                program: program.label.clone(),
                name: name.to_string(),
            });
        }
        program.uniforms.set(name, value)?;

        self.record(Command::SetUniform {
            program: id,
            name: name.to_string(),
            value,
        });
        Ok(())
    }

    fn bind_texture(&mut self, name: &str, texture: TextureId) -> Result<()> {
        let (id, program) = self.bound_program()?;
        if !program.interface.has_texture(name) {
            return Err(Error::UniformNotFound {
                program: program.label.clone(),
                name: name.to_string(),
            });
        }
        program.textures.retain(|(n, _)| n != name);
        program.textures.push((name.to_string(), texture));

        self.record(Command::BindTexture {
            program: id,
            name: name.to_string(),
            texture,
        });
        Ok(())
    }

    fn draw_arrays(&mut self, primitive: Primitive, vertex_count: u32) -> Result<()> {
        let target = self.bound_target.ok_or(Error::NoTargetBound)?;
        let program_id = self.current_program.ok_or(Error::NoProgramBound)?;
        let vertex_array = self
            .current_vertex_array
            .ok_or(Error::NoVertexArrayBound)?;

        let program = self.program(program_id)?;
        let array = self
            .vertex_arrays
            .get(vertex_array.0 as usize)
            .ok_or(Error::UnknownHandle {
                kind: "vertex array",
                id: vertex_array.0,
            })?;
        if let Some(missing) = program
            .interface
            .attributes
            .iter()
            .find(|a| !array.attributes.contains(a))
        {
            return Err(Error::AttributeNotFound {
                program: program.label.clone(),
                name: missing.clone(),
            });
        }

        self.record(Command::Draw {
            program: program_id,
            vertex_array,
            target,
            primitive,
            vertex_count,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::program::{attributes, uniforms};
    use glam::{Mat4, Vec3};

    const POINT_VERTEX: &str = include_str!("../shaders/point.vert.wgsl");
    const POINT_FRAGMENT: &str = include_str!("../shaders/point.frag.wgsl");

    fn point_program(ctx: &mut TraceContext) -> ProgramId {
        let descriptor = ProgramDescriptor::new(
            "point",
            POINT_VERTEX,
            POINT_FRAGMENT,
            ProgramInterface::points(),
        );
        ctx.compile_program(&descriptor).unwrap()
    }

    #[test]
    fn test_set_uniform_requires_bound_program() {
        let mut ctx = TraceContext::new();
        let result = ctx.set_uniform(uniforms::WORLD, UniformValue::Mat4(Mat4::IDENTITY));
        assert!(matches!(result, Err(Error::NoProgramBound)));
    }

    #[test]
    fn test_set_uniform_unknown_name() {
        let mut ctx = TraceContext::new();
        let program = point_program(&mut ctx);
        ctx.use_program(Some(program));

        let result = ctx.set_uniform(uniforms::LIGHT, UniformValue::Vec3(Vec3::ZERO));
        match result {
            Err(Error::UniformNotFound { program, name }) => {
                assert_eq!(program, "point");
                assert_eq!(name, "u_light");
            }
            other => panic!("expected UniformNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_uniform_state_persists_per_program() {
        let mut ctx = TraceContext::new();
        let program = point_program(&mut ctx);
        ctx.use_program(Some(program));
        ctx.set_uniform(
            uniforms::WORLD,
            UniformValue::Mat4(Mat4::from_translation(Vec3::X)),
        )
        .unwrap();
        ctx.use_program(None);

        let block = ctx.uniforms(program).unwrap();
        assert_eq!(block.world(), Mat4::from_translation(Vec3::X));
    }

    #[test]
    fn test_buffer_attribute_rejects_undeclared_attribute() {
        let mut ctx = TraceContext::new();
        let program = point_program(&mut ctx);
        let vao = ctx.create_vertex_array();

        let result = ctx.buffer_attribute(program, vao, attributes::NORMAL, &[0.0; 3]);
        assert!(matches!(result, Err(Error::AttributeNotFound { .. })));
    }

    #[test]
    fn test_draw_requires_every_program_attribute() {
        let mut ctx = TraceContext::new();
        let program = point_program(&mut ctx);
        let vao = ctx.create_vertex_array();

        ctx.bind_target(None).unwrap();
        ctx.use_program(Some(program));
        ctx.bind_vertex_array(Some(vao));
        let result = ctx.draw_arrays(Primitive::Points, 1);
        assert!(matches!(result, Err(Error::AttributeNotFound { .. })));

        ctx.buffer_attribute(program, vao, attributes::VERTEX, &[0.0; 3])
            .unwrap();
        assert!(ctx.draw_arrays(Primitive::Points, 1).is_ok());
        assert_eq!(ctx.draw_count(), 1);
    }

    #[test]
    fn test_compile_rejects_name_only_found_as_prefix() {
        let mut ctx = TraceContext::new();
        let vertex = "struct Uniforms { u_world: mat4x4<f32>, u_light_space: mat4x4<f32> };\n\
            @vertex fn vs_main(@location(0) a_vertex: vec3<f32>) -> @builtin(position) vec4<f32> \
            { return uniforms.u_world * vec4<f32>(a_vertex, 1.0); }";
        let descriptor = ProgramDescriptor::new(
            "light prefix",
            vertex,
            "@fragment fn fs_main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }",
            ProgramInterface::new(
                &[attributes::VERTEX],
                &[uniforms::WORLD, uniforms::LIGHT],
                &[],
            ),
        );

        let result = ctx.compile_program(&descriptor);
        assert!(matches!(result, Err(Error::ProgramCompile { .. })));
        assert!(ctx.commands().is_empty());
    }

    #[test]
    fn test_draw_outside_target_fails() {
        let mut ctx = TraceContext::new();
        assert!(matches!(
            ctx.draw_arrays(Primitive::Triangles, 3),
            Err(Error::NoTargetBound)
        ));
    }

    #[test]
    fn test_released_target_cannot_be_bound() {
        let mut ctx = TraceContext::new();
        let target = ctx.create_offscreen_target(64, 32).unwrap();
        ctx.release_offscreen_target(&target).unwrap();

        assert!(matches!(
            ctx.bind_target(Some(target.target)),
            Err(Error::UnknownHandle { kind: "target", .. })
        ));
    }

    #[test]
    fn test_bind_unbind_leaves_context_unbound() {
        let mut ctx = TraceContext::new();
        ctx.bind_target(None).unwrap();
        ctx.clear([0.0, 0.0, 0.0, 1.0]).unwrap();
        assert!(!ctx.is_unbound());
        ctx.unbind_target().unwrap();
        assert!(ctx.is_unbound());
        assert!(matches!(ctx.unbind_target(), Err(Error::NoTargetBound)));
    }
}
