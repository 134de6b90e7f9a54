use glam::{Mat4, Vec3};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::core::{
    Error, OffscreenTarget, ProgramDescriptor, ProgramId, RenderContext, RenderState, Result,
};
use crate::material::PassContext;
use crate::math::degree_to_radian;
use crate::shape::Shape;

/// Near clip plane of the perspective projection
pub const NEAR_PLANE: f32 = 1.0;

pub const DEFAULT_FIELD_OF_VIEW_DEGREES: f32 = 60.0;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    Orthographic,
    #[default]
    Perspective,
}

/// Render surface extent plus the depth range, which is the far clip plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSize {
    pub width: u32,
    pub height: u32,
    pub depth: f32,
}

/// Index of a shape inside its scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(pub usize);

/// Camera, light and an ordered list of shapes, drawn in insertion order
pub struct Scene {
    size: SceneSize,
    camera: Camera,
    light: Vec3,
    light_indicator: Option<ShapeId>,
    shapes: Vec<Shape>,
    pub field_of_view: f32,
    pub projection_mode: Projection,
    pub clear_color: [f64; 4],
}

impl Scene {
    /// Create a scene and enable depth testing and back-face culling on `ctx`
    pub fn new(ctx: &mut dyn RenderContext, size: SceneSize) -> Result<Self> {
        if size.depth.is_nan() || size.depth <= NEAR_PLANE {
            return Err(Error::InvalidDepthRange { depth: size.depth });
        }

        ctx.set_render_state(RenderState::SCENE);
        debug!(
            "Scene {}x{} with depth range {}",
            size.width, size.height, size.depth
        );

        Ok(Self {
            size,
            camera: Camera::default(),
            light: Vec3::ZERO,
            light_indicator: None,
            shapes: Vec::new(),
            field_of_view: degree_to_radian(DEFAULT_FIELD_OF_VIEW_DEGREES),
            projection_mode: Projection::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        })
    }

    pub fn size(&self) -> SceneSize {
        self.size
    }

    /// Change the surface extent; the depth range is kept
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size.width = width;
        self.size.height = height;
    }

    pub fn compile_program(
        &self,
        ctx: &mut dyn RenderContext,
        descriptor: &ProgramDescriptor,
    ) -> Result<ProgramId> {
        ctx.compile_program(descriptor)
    }

    /// Off-screen color + depth target the size of the surface
    pub fn create_offscreen_depth_target(
        &self,
        ctx: &mut dyn RenderContext,
    ) -> Result<OffscreenTarget> {
        ctx.create_offscreen_target(self.size.width, self.size.height)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn add(&mut self, shape: Shape) -> ShapeId {
        self.shapes.push(shape);
        ShapeId(self.shapes.len() - 1)
    }

    pub fn shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(id.0)
    }

    pub fn shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(id.0)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Light position. Follows the indicator shape when one is designated.
    pub fn light(&self) -> Vec3 {
        self.light_indicator
            .and_then(|id| self.shape(id))
            .map(Shape::translation)
            .unwrap_or(self.light)
    }

    /// Designate `id` as the shape marking the light. The light moves to the
    /// shape's current translation.
    pub fn set_light_indicator(&mut self, id: ShapeId) -> Result<()> {
        let shape = self.shape(id).ok_or(Error::UnknownHandle {
            kind: "shape",
            id: id.0 as u32,
        })?;
        self.light = shape.translation();
        self.light_indicator = Some(id);
        Ok(())
    }

    pub fn light_indicator(&self) -> Option<ShapeId> {
        self.light_indicator
    }

    pub fn set_light(&mut self, position: Vec3) {
        self.light = position;
        if let Some(shape) = self.light_indicator.and_then(|id| self.shapes.get_mut(id.0)) {
            shape.move_to(position);
        }
    }

    pub fn move_light_x(&mut self, x: f32) {
        let light = self.light();
        self.set_light(Vec3::new(x, light.y, light.z));
    }

    pub fn move_light_y(&mut self, y: f32) {
        let light = self.light();
        self.set_light(Vec3::new(light.x, y, light.z));
    }

    pub fn move_light_z(&mut self, z: f32) {
        let light = self.light();
        self.set_light(Vec3::new(light.x, light.y, z));
    }

    /// Projection matrix with a [0, 1] clip depth range.
    ///
    /// Orthographic maps x in [0, W] and y in [H, 0] onto clip space, with
    /// near and far swapped so depth grows with z: z = -D/2 lands on 0 and
    /// z = D/2 on 1.
    pub fn projection(&self) -> Mat4 {
        let width = self.size.width as f32;
        let height = self.size.height as f32;
        let depth = self.size.depth;

        match self.projection_mode {
            Projection::Orthographic => {
                Mat4::orthographic_rh(0.0, width, height, 0.0, depth / 2.0, -depth / 2.0)
            }
            Projection::Perspective => {
                Mat4::perspective_rh(self.field_of_view, width / height, NEAR_PLANE, depth)
            }
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.camera.view()
    }

    /// Clear `target` (the surface when `None`) and draw every shape into it.
    /// The target is unbound again before returning, also on failure.
    pub fn draw(
        &self,
        ctx: &mut dyn RenderContext,
        target: Option<&OffscreenTarget>,
        pass: &PassContext,
    ) -> Result<()> {
        ctx.bind_target(target.map(|t| t.target))?;
        let drawn = self.draw_shapes(ctx, pass);
        let unbound = ctx.unbind_target();
        drawn.and(unbound)
    }

    fn draw_shapes(&self, ctx: &mut dyn RenderContext, pass: &PassContext) -> Result<()> {
        ctx.clear(self.clear_color)?;

        let view_projection = self.view_projection();
        for shape in &self.shapes {
            shape.draw(ctx, view_projection, pass)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TraceContext;

    fn scene(ctx: &mut TraceContext) -> Scene {
        let size = SceneSize {
            width: 800,
            height: 600,
            depth: 1000.0,
        };
        Scene::new(ctx, size).unwrap()
    }

    #[test]
    fn test_defaults() {
        let mut ctx = TraceContext::new();
        let scene = scene(&mut ctx);

        assert_eq!(scene.projection_mode, Projection::Perspective);
        assert!((scene.field_of_view - std::f32::consts::FRAC_PI_3).abs() < 1e-6);
        assert_eq!(scene.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(scene.light(), Vec3::ZERO);
        assert_eq!(ctx.render_state(), RenderState::SCENE);
    }

    #[test]
    fn test_resize_keeps_depth() {
        let mut ctx = TraceContext::new();
        let mut scene = scene(&mut ctx);
        scene.resize(1024, 768);

        let size = scene.size();
        assert_eq!((size.width, size.height), (1024, 768));
        assert_eq!(size.depth, 1000.0);
    }

    #[test]
    fn test_unknown_light_indicator() {
        let mut ctx = TraceContext::new();
        let mut scene = scene(&mut ctx);
        assert!(matches!(
            scene.set_light_indicator(ShapeId(3)),
            Err(Error::UnknownHandle { kind: "shape", id: 3 })
        ));
    }

    #[test]
    fn test_set_light_without_indicator() {
        let mut ctx = TraceContext::new();
        let mut scene = scene(&mut ctx);
        scene.set_light(Vec3::new(1.0, 2.0, 3.0));
        scene.move_light_z(-4.0);
        assert_eq!(scene.light(), Vec3::new(1.0, 2.0, -4.0));
    }

    #[test]
    fn test_projection_serde_names() {
        let parsed: Projection = serde_json::from_str("\"orthographic\"").unwrap();
        assert_eq!(parsed, Projection::Orthographic);
        assert_eq!(
            serde_json::to_string(&Projection::Perspective).unwrap(),
            "\"perspective\""
        );
    }
}
