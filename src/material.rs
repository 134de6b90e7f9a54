use glam::{Mat4, Vec3, Vec4};

use crate::core::{uniforms, RenderContext, Result, TextureId, UniformValue};

/// Which pass a draw belongs to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PassKind {
    /// Rendering from the light into the off-screen target
    Depth,
    /// Rendering from the camera, with the light-space result of the depth pass
    Lit {
        light_space: Mat4,
        shadow_texture: TextureId,
    },
}

/// Per-draw inputs shared by every shape in a pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassContext {
    pub kind: PassKind,
    pub light: Vec3,
}

impl PassContext {
    pub fn depth(light: Vec3) -> Self {
        Self {
            kind: PassKind::Depth,
            light,
        }
    }

    pub fn lit(light: Vec3, light_space: Mat4, shadow_texture: TextureId) -> Self {
        Self {
            kind: PassKind::Lit {
                light_space,
                shadow_texture,
            },
            light,
        }
    }

    pub fn is_depth(&self) -> bool {
        matches!(self.kind, PassKind::Depth)
    }
}

/// How a shape takes part in shadowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadowMode {
    /// Pushes nothing; the program has no shadow inputs
    #[default]
    Unaffected,
    /// Never shows a shadow on itself
    Excluded,
    /// Shows the shadow cast onto it, outside the depth pass
    Receiver,
}

/// Uniforms a shape pushes on top of its transform
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Material {
    /// Set once at construction
    pub color: Option<Vec4>,
    /// Push the light position every draw
    pub lit: bool,
    pub shadow: ShadowMode,
}

impl Material {
    pub fn new(color: Vec4) -> Self {
        Self {
            color: Some(color),
            ..Default::default()
        }
    }

    pub fn lit(mut self) -> Self {
        self.lit = true;
        self
    }

    pub fn with_shadow(mut self, shadow: ShadowMode) -> Self {
        self.shadow = shadow;
        self
    }

    /// Static uniforms, pushed with the shape's program bound
    pub fn init(&self, ctx: &mut dyn RenderContext) -> Result<()> {
        if let Some(color) = self.color {
            ctx.set_uniform(uniforms::COLOR, UniformValue::Vec4(color))?;
        }
        Ok(())
    }

    /// Per-draw uniforms for `pass`, pushed with the shape's program bound
    pub fn apply(&self, ctx: &mut dyn RenderContext, pass: &PassContext) -> Result<()> {
        if self.lit {
            ctx.set_uniform(uniforms::LIGHT, UniformValue::Vec3(pass.light))?;
        }

        match (self.shadow, pass.kind) {
            (ShadowMode::Unaffected, _) => Ok(()),
            (ShadowMode::Excluded, _) | (ShadowMode::Receiver, PassKind::Depth) => {
                ctx.set_uniform(uniforms::SHOW_SHADOW, UniformValue::Int(0))
            }
            (
                ShadowMode::Receiver,
                PassKind::Lit {
                    light_space,
                    shadow_texture,
                },
            ) => {
                ctx.set_uniform(uniforms::LIGHT_SPACE, UniformValue::Mat4(light_space))?;
                ctx.bind_texture(uniforms::SHADOW_TEXTURE, shadow_texture)?;
                ctx.set_uniform(uniforms::SHOW_SHADOW, UniformValue::Int(1))
            }
        }
    }
}
