use glam::{Mat4, Vec3};
use log::debug;

use crate::config::{DemoConfig, ShapeConfig};
use crate::core::{
    Error, OffscreenTarget, ProgramDescriptor, ProgramId, ProgramInterface, RenderContext,
    Result,
};
use crate::geometry::{BACKDROP, LETTER_F, LIGHT_POINT};
use crate::material::{Material, PassContext, ShadowMode};
use crate::math::{degree_to_radian, radian_to_degree};
use crate::scene::{Scene, SceneSize, ShapeId};
use crate::shape::Shape;

/// WGSL sources of the demo programs
pub mod sources {
    pub const TRIANGLE_VERTEX: &str = include_str!("shaders/triangle.vert.wgsl");
    pub const TRIANGLE_FRAGMENT: &str = include_str!("shaders/triangle.frag.wgsl");
    pub const TRIANGLE_DEPTH_FRAGMENT: &str = include_str!("shaders/triangle_depth.frag.wgsl");
    pub const POINT_VERTEX: &str = include_str!("shaders/point.vert.wgsl");
    pub const POINT_FRAGMENT: &str = include_str!("shaders/point.frag.wgsl");
}

/// Scalar exposed as a slider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlTarget {
    LetterX,
    LetterY,
    LetterZ,
    RotateX,
    RotateY,
    RotateZ,
    LightX,
    LightY,
}

impl ControlTarget {
    pub const ALL: [ControlTarget; 8] = [
        ControlTarget::LetterX,
        ControlTarget::LetterY,
        ControlTarget::LetterZ,
        ControlTarget::RotateX,
        ControlTarget::RotateY,
        ControlTarget::RotateZ,
        ControlTarget::LightX,
        ControlTarget::LightY,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ControlTarget::LetterX => "X",
            ControlTarget::LetterY => "Y",
            ControlTarget::LetterZ => "Z",
            ControlTarget::RotateX => "Rotate X",
            ControlTarget::RotateY => "Rotate Y",
            ControlTarget::RotateZ => "Rotate Z",
            ControlTarget::LightX => "Light X",
            ControlTarget::LightY => "Light Y",
        }
    }
}

/// Bounded slider description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Control {
    pub target: ControlTarget,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
}

/// A shape drawn with a different program while rendering from the light
#[derive(Debug, Clone, Copy)]
struct Caster {
    shape: ShapeId,
    lit: ProgramId,
    depth: ProgramId,
}

/// Extruded letter in front of a backdrop, lit by a movable point light.
///
/// Every redraw renders the scene twice: once from the light into an
/// off-screen target holding encoded depth, then from the camera, where the
/// backdrop projects each fragment into light space and compares.
pub struct ShadowDemo {
    scene: Scene,
    letter: ShapeId,
    backdrop: ShapeId,
    light: ShapeId,
    casters: [Caster; 2],
    target: OffscreenTarget,
    light_space: Mat4,
}

impl ShadowDemo {
    pub fn new(ctx: &mut dyn RenderContext, config: &DemoConfig) -> Result<Self> {
        let mut scene = Scene::new(
            ctx,
            SceneSize {
                width: config.width,
                height: config.height,
                depth: config.depth,
            },
        )?;
        scene.projection_mode = config.projection;
        scene.field_of_view = degree_to_radian(config.field_of_view);
        scene.clear_color = config.clear_color;

        let letter_lit = compile_lit(&scene, ctx, "letter")?;
        let letter_depth = compile_depth(&scene, ctx, "letter depth")?;
        let backdrop_lit = compile_lit(&scene, ctx, "backdrop")?;
        let backdrop_depth = compile_depth(&scene, ctx, "backdrop depth")?;
        let point = scene.compile_program(
            ctx,
            &ProgramDescriptor::new(
                "light point",
                sources::POINT_VERTEX,
                sources::POINT_FRAGMENT,
                ProgramInterface::points(),
            ),
        )?;

        let mut letter_shape = Shape::triangles(
            ctx,
            letter_lit,
            &LETTER_F,
            Material::new(config.letter.color())
                .lit()
                .with_shadow(ShadowMode::Excluded),
        )?;
        place(&mut letter_shape, &config.letter);

        let mut backdrop_shape = Shape::triangles(
            ctx,
            backdrop_lit,
            &BACKDROP,
            Material::new(config.backdrop.color())
                .lit()
                .with_shadow(ShadowMode::Receiver),
        )?;
        place(&mut backdrop_shape, &config.backdrop);

        let mut light_shape = Shape::points(
            ctx,
            point,
            &LIGHT_POINT,
            Material::new(config.light.color()),
        )?;
        light_shape.move_to(config.light.translation());

        let letter = scene.add(letter_shape);
        let backdrop = scene.add(backdrop_shape);
        let light = scene.add(light_shape);
        scene.set_light_indicator(light)?;

        let target = scene.create_offscreen_depth_target(ctx)?;
        log::info!(
            "Shadow demo ready: {} shapes, {}x{} shadow target",
            scene.shapes().len(),
            target.width,
            target.height
        );

        Ok(Self {
            scene,
            letter,
            backdrop,
            light,
            casters: [
                Caster {
                    shape: letter,
                    lit: letter_lit,
                    depth: letter_depth,
                },
                Caster {
                    shape: backdrop,
                    lit: backdrop_lit,
                    depth: backdrop_depth,
                },
            ],
            target,
            light_space: Mat4::IDENTITY,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn letter(&self) -> ShapeId {
        self.letter
    }

    pub fn backdrop(&self) -> ShapeId {
        self.backdrop
    }

    pub fn light_indicator(&self) -> ShapeId {
        self.light
    }

    pub fn shadow_target(&self) -> &OffscreenTarget {
        &self.target
    }

    /// View-projection of the light from the last depth pass
    pub fn light_space(&self) -> Mat4 {
        self.light_space
    }

    /// Lit and depth program of each shadow caster
    pub fn caster_programs(&self) -> impl Iterator<Item = (ShapeId, ProgramId, ProgramId)> + '_ {
        self.casters.iter().map(|c| (c.shape, c.lit, c.depth))
    }

    /// Full two-pass redraw: depth from the light, then the lit scene
    pub fn redraw(&mut self, ctx: &mut dyn RenderContext) -> Result<()> {
        self.light_space = self.depth_pass(ctx)?;
        self.lit_pass(ctx)
    }

    /// Render encoded depth from the light into the shadow target and return
    /// the light-space matrix. Caster programs are restored on every path.
    pub fn depth_pass(&mut self, ctx: &mut dyn RenderContext) -> Result<Mat4> {
        let light = self.scene.light();
        let anchor = self.shape(self.letter)?.anchor();

        self.swap_programs(|caster| caster.depth);
        self.scene.camera_mut().move_to(light);
        self.scene.camera_mut().look_at(anchor);

        let drawn = self
            .scene
            .draw(ctx, Some(&self.target), &PassContext::depth(light));
        let light_space = self.scene.view_projection();
        self.swap_programs(|caster| caster.lit);

        debug!("Depth pass from {:?} towards {:?}", light, anchor);
        drawn.map(|_| light_space)
    }

    /// Render the scene from the default camera with shadows applied
    pub fn lit_pass(&mut self, ctx: &mut dyn RenderContext) -> Result<()> {
        self.scene.camera_mut().reset();
        let pass = PassContext::lit(self.scene.light(), self.light_space, self.target.texture);
        self.scene.draw(ctx, None, &pass)
    }

    /// Rebuild the shadow target for a new surface size
    pub fn resize(&mut self, ctx: &mut dyn RenderContext, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }

        ctx.release_offscreen_target(&self.target)?;
        self.scene.resize(width, height);
        self.target = self.scene.create_offscreen_depth_target(ctx)?;
        debug!("Shadow target rebuilt at {}x{}", width, height);
        Ok(())
    }

    /// Slider ranges for the current surface size
    pub fn controls(&self) -> Vec<Control> {
        let size = self.scene.size();
        let half_width = size.width as f32 / 2.0;
        let half_height = size.height as f32 / 2.0;
        let third_height = size.height as f32 / 3.0;

        ControlTarget::ALL
            .iter()
            .map(|&target| {
                let (min, max) = match target {
                    ControlTarget::LetterX | ControlTarget::LightX => (-half_width, half_width),
                    ControlTarget::LetterY => (-third_height, third_height),
                    ControlTarget::LetterZ => (-800.0, -500.0),
                    ControlTarget::RotateX | ControlTarget::RotateY | ControlTarget::RotateZ => {
                        (0.0, 360.0)
                    }
                    ControlTarget::LightY => (-half_height, half_height),
                };
                Control {
                    target,
                    label: target.label(),
                    min,
                    max,
                }
            })
            .collect()
    }

    /// Current value of `target` in slider units (degrees for rotations)
    pub fn value(&self, target: ControlTarget) -> f32 {
        let (translation, rotation) = self
            .scene
            .shape(self.letter)
            .map(|letter| (letter.translation(), letter.rotation()))
            .unwrap_or_default();
        let light = self.scene.light();

        match target {
            ControlTarget::LetterX => translation.x,
            ControlTarget::LetterY => translation.y,
            ControlTarget::LetterZ => translation.z,
            ControlTarget::RotateX => radian_to_degree(rotation.x),
            ControlTarget::RotateY => radian_to_degree(rotation.y),
            ControlTarget::RotateZ => radian_to_degree(rotation.z),
            ControlTarget::LightX => light.x,
            ControlTarget::LightY => light.y,
        }
    }

    /// Write a slider value back into the scene. Callers redraw afterwards.
    pub fn apply(&mut self, target: ControlTarget, value: f32) {
        match target {
            ControlTarget::LightX => return self.scene.move_light_x(value),
            ControlTarget::LightY => return self.scene.move_light_y(value),
            _ => {}
        }

        let Some(letter) = self.scene.shape_mut(self.letter) else {
            return;
        };
        match target {
            ControlTarget::LetterX => letter.move_x(value),
            ControlTarget::LetterY => letter.move_y(value),
            ControlTarget::LetterZ => letter.move_z(value),
            ControlTarget::RotateX => letter.rotate_x(value),
            ControlTarget::RotateY => letter.rotate_y(value),
            ControlTarget::RotateZ => letter.rotate_z(value),
            ControlTarget::LightX | ControlTarget::LightY => {}
        }
    }

    fn shape(&self, id: ShapeId) -> Result<&Shape> {
        self.scene.shape(id).ok_or(Error::UnknownHandle {
            kind: "shape",
            id: id.0 as u32,
        })
    }

    fn swap_programs(&mut self, program: impl Fn(&Caster) -> ProgramId) {
        for caster in &self.casters {
            if let Some(shape) = self.scene.shape_mut(caster.shape) {
                shape.set_program(program(caster));
            }
        }
    }
}

fn compile_lit(scene: &Scene, ctx: &mut dyn RenderContext, label: &str) -> Result<ProgramId> {
    scene.compile_program(
        ctx,
        &ProgramDescriptor::new(
            label,
            sources::TRIANGLE_VERTEX,
            sources::TRIANGLE_FRAGMENT,
            ProgramInterface::lit_triangles(),
        ),
    )
}

fn compile_depth(scene: &Scene, ctx: &mut dyn RenderContext, label: &str) -> Result<ProgramId> {
    scene.compile_program(
        ctx,
        &ProgramDescriptor::new(
            label,
            sources::TRIANGLE_VERTEX,
            sources::TRIANGLE_DEPTH_FRAGMENT,
            ProgramInterface::depth_triangles(),
        ),
    )
}

fn place(shape: &mut Shape, config: &ShapeConfig) {
    shape.move_to(config.translation());
    let rotation: Vec3 = config.rotation();
    shape.rotate_x(rotation.x);
    shape.rotate_y(rotation.y);
    shape.rotate_z(rotation.z);
}
