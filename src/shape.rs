use glam::{Mat4, Vec3};
use log::debug;

use crate::core::{
    attributes, uniforms, Error, Primitive, ProgramId, RenderContext, Result, UniformValue,
    VertexArrayId,
};
use crate::material::{Material, PassContext};
use crate::math::{calculate_normals, degree_to_radian, COMPONENTS, TRIANGLE_STRIDE};

/// A drawable: one program, one vertex array, one transform
#[derive(Debug, Clone)]
pub struct Shape {
    program: ProgramId,
    vertex_array: VertexArrayId,
    vertices: Vec<f32>,
    normals: Option<Vec<f32>>,
    primitive: Primitive,
    material: Material,
    pub translation: Vec3,
    /// Radians per axis
    pub rotation: Vec3,
}

impl Shape {
    /// Filled triangles with flat per-face normals.
    ///
    /// `vertices` holds three points of three floats per triangle.
    pub fn triangles(
        ctx: &mut dyn RenderContext,
        program: ProgramId,
        vertices: &[f32],
        material: Material,
    ) -> Result<Self> {
        let normals = calculate_normals(vertices)?;
        Self::build(
            ctx,
            program,
            vertices,
            Some(normals),
            Primitive::Triangles,
            material,
        )
    }

    /// One point per three floats of `vertices`
    pub fn points(
        ctx: &mut dyn RenderContext,
        program: ProgramId,
        vertices: &[f32],
        material: Material,
    ) -> Result<Self> {
        if vertices.len() % COMPONENTS != 0 {
            return Err(Error::InvalidVertexData {
                len: vertices.len(),
                multiple: COMPONENTS,
            });
        }
        Self::build(ctx, program, vertices, None, Primitive::Points, material)
    }

    fn build(
        ctx: &mut dyn RenderContext,
        program: ProgramId,
        vertices: &[f32],
        normals: Option<Vec<f32>>,
        primitive: Primitive,
        material: Material,
    ) -> Result<Self> {
        let vertex_array = ctx.create_vertex_array();

        with_bindings(ctx, program, vertex_array, |ctx| {
            material.init(ctx)?;
            ctx.buffer_attribute(program, vertex_array, attributes::VERTEX, vertices)?;
            if let Some(normals) = &normals {
                ctx.buffer_attribute(program, vertex_array, attributes::NORMAL, normals)?;
            }
            Ok(())
        })?;

        debug!(
            "Built {:?} shape with {} vertices on {:?}",
            primitive,
            vertices.len() / COMPONENTS,
            program
        );

        Ok(Self {
            program,
            vertex_array,
            vertices: vertices.to_vec(),
            normals,
            primitive,
            material,
            translation: Vec3::ZERO,
            rotation: Vec3::ZERO,
        })
    }

    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Draw with `program` from now on. It must accept the same attributes.
    pub fn set_program(&mut self, program: ProgramId) {
        self.program = program;
    }

    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn normals(&self) -> Option<&[f32]> {
        self.normals.as_deref()
    }

    pub fn vertex_count(&self) -> u32 {
        (self.vertices.len() / COMPONENTS) as u32
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn move_x(&mut self, x: f32) {
        self.translation.x = x;
    }

    pub fn move_y(&mut self, y: f32) {
        self.translation.y = y;
    }

    pub fn move_z(&mut self, z: f32) {
        self.translation.z = z;
    }

    pub fn move_to(&mut self, position: Vec3) {
        self.translation = position;
    }

    /// Set the absolute rotation about X, in degrees
    pub fn rotate_x(&mut self, degrees: f32) {
        self.rotation.x = degree_to_radian(degrees);
    }

    pub fn rotate_y(&mut self, degrees: f32) {
        self.rotation.y = degree_to_radian(degrees);
    }

    pub fn rotate_z(&mut self, degrees: f32) {
        self.rotation.z = degree_to_radian(degrees);
    }

    /// Model-to-world matrix. Points ignore rotation.
    pub fn world(&self) -> Mat4 {
        let translation = Mat4::from_translation(self.translation);
        match self.primitive {
            Primitive::Triangles => {
                translation
                    * Mat4::from_rotation_x(self.rotation.x)
                    * Mat4::from_rotation_y(self.rotation.y)
                    * Mat4::from_rotation_z(self.rotation.z)
            }
            Primitive::Points => translation,
        }
    }

    /// First vertex in world space
    pub fn anchor(&self) -> Vec3 {
        let first = self
            .vertices
            .get(..COMPONENTS)
            .map(Vec3::from_slice)
            .unwrap_or(Vec3::ZERO);
        self.world().transform_point3(first)
    }

    pub fn draw(
        &self,
        ctx: &mut dyn RenderContext,
        view_projection: Mat4,
        pass: &PassContext,
    ) -> Result<()> {
        with_bindings(ctx, self.program, self.vertex_array, |ctx| {
            ctx.set_uniform(uniforms::WORLD, UniformValue::Mat4(self.world()))?;
            ctx.set_uniform(
                uniforms::VIEW_PROJECTION,
                UniformValue::Mat4(view_projection),
            )?;
            self.material.apply(ctx, pass)?;
            ctx.draw_arrays(self.primitive, self.vertex_count())
        })
    }
}

/// Run `f` with `program` and `vertex_array` bound, unbinding both afterwards
fn with_bindings<T>(
    ctx: &mut dyn RenderContext,
    program: ProgramId,
    vertex_array: VertexArrayId,
    f: impl FnOnce(&mut dyn RenderContext) -> Result<T>,
) -> Result<T> {
    ctx.use_program(Some(program));
    ctx.bind_vertex_array(Some(vertex_array));
    let result = f(ctx);
    ctx.bind_vertex_array(None);
    ctx.use_program(None);
    result
}
