use std::borrow::Cow;

use glam::{Mat4, Vec3, Vec4};

use super::error::{Error, Result, ShaderStage};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Attribute names shared by every shape program
pub mod attributes {
    pub const VERTEX: &str = "a_vertex";
    pub const NORMAL: &str = "a_normal";
}

/// Uniform and texture names shared by every shape program
pub mod uniforms {
    pub const WORLD: &str = "u_world";
    pub const VIEW_PROJECTION: &str = "u_view_projection";
    pub const LIGHT_SPACE: &str = "u_light_space";
    pub const COLOR: &str = "u_color";
    pub const LIGHT: &str = "u_light";
    pub const SHOW_SHADOW: &str = "u_show_shadow";
    pub const SHADOW_TEXTURE: &str = "u_shadow_texture";
}

/// Names a program exposes to shapes.
///
/// Attributes are listed in location order: the first attribute is bound to
/// `@location(0)`, the second to `@location(1)` and so on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramInterface {
    pub attributes: Vec<String>,
    pub uniforms: Vec<String>,
    pub textures: Vec<String>,
}

impl ProgramInterface {
    pub fn new(attributes: &[&str], uniforms: &[&str], textures: &[&str]) -> Self {
        let owned = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            attributes: owned(attributes),
            uniforms: owned(uniforms),
            textures: owned(textures),
        }
    }

    /// Lit triangle program: normals, light and shadow receiving
    pub fn lit_triangles() -> Self {
        Self::new(
            &[attributes::VERTEX, attributes::NORMAL],
            &[
                uniforms::WORLD,
                uniforms::VIEW_PROJECTION,
                uniforms::LIGHT_SPACE,
                uniforms::COLOR,
                uniforms::LIGHT,
                uniforms::SHOW_SHADOW,
            ],
            &[uniforms::SHADOW_TEXTURE],
        )
    }

    /// Depth variant of the triangle program, written into the light-space target.
    ///
    /// The depth shaders read only the transforms; the light and shadow names
    /// are declared so the caster's material can push into either variant.
    pub fn depth_triangles() -> Self {
        Self::new(
            &[attributes::VERTEX, attributes::NORMAL],
            &[
                uniforms::WORLD,
                uniforms::VIEW_PROJECTION,
                uniforms::LIGHT_SPACE,
                uniforms::COLOR,
                uniforms::LIGHT,
                uniforms::SHOW_SHADOW,
            ],
            &[],
        )
    }

    pub fn points() -> Self {
        Self::new(
            &[attributes::VERTEX],
            &[uniforms::WORLD, uniforms::VIEW_PROJECTION, uniforms::COLOR],
            &[],
        )
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .position(|a| a == name)
            .map(|index| index as u32)
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.iter().any(|u| u == name)
    }

    pub fn has_texture(&self, name: &str) -> bool {
        self.textures.iter().any(|t| t == name)
    }
}

/// Source text and interface of a program before compilation
#[derive(Debug, Clone)]
pub struct ProgramDescriptor {
    pub label: String,
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
    pub interface: ProgramInterface,
}

impl ProgramDescriptor {
    pub fn new(
        label: impl Into<String>,
        vertex: impl Into<Cow<'static, str>>,
        fragment: impl Into<Cow<'static, str>>,
        interface: ProgramInterface,
    ) -> Self {
        Self {
            label: label.into(),
            vertex: vertex.into(),
            fragment: fragment.into(),
            interface,
        }
    }

    /// Checks the parts of the contract that do not need a driver: both
    /// entry points exist and every declared name occurs as a whole
    /// identifier in one of the stages. A member of the `Uniforms` struct
    /// counts as an occurrence, so a uniform that is declared but never read
    /// passes; the driver still rejects names the struct lacks.
    pub fn validate(&self) -> Result<()> {
        self.require_entry(ShaderStage::Vertex, &self.vertex, VERTEX_ENTRY)?;
        self.require_entry(ShaderStage::Fragment, &self.fragment, FRAGMENT_ENTRY)?;

        let vertex = identifiers(&self.vertex);
        let fragment = identifiers(&self.fragment);
        let interface = &self.interface;
        let unreferenced: Vec<&str> = interface
            .attributes
            .iter()
            .chain(&interface.uniforms)
            .chain(&interface.textures)
            .map(String::as_str)
            .filter(|name| !vertex.contains(name) && !fragment.contains(name))
            .collect();

        if unreferenced.is_empty() {
            Ok(())
        } else {
            Err(self.compile_error(
                ShaderStage::Link,
                format!("declared but never referenced: {}", unreferenced.join(", ")),
            ))
        }
    }

    pub fn compile_error(&self, stage: ShaderStage, log: impl Into<String>) -> Error {
        Error::ProgramCompile {
            label: self.label.clone(),
            stage,
            log: log.into(),
        }
    }

    fn require_entry(&self, stage: ShaderStage, source: &str, entry: &str) -> Result<()> {
        if source.contains(&format!("fn {entry}(")) {
            Ok(())
        } else {
            Err(self.compile_error(stage, format!("entry point `{entry}` not found")))
        }
    }
}

/// Identifier tokens of a WGSL source
fn identifiers(source: &str) -> Vec<&str> {
    source
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Value pushed into a named uniform slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Vec3(Vec3),
    Vec4(Vec4),
    Int(i32),
}

/// CPU mirror of the uniform block every shape program declares.
///
/// Field order and padding match the WGSL `Uniforms` struct in
/// `src/shaders/`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct UniformBlock {
    pub world: [[f32; 4]; 4],
    pub view_projection: [[f32; 4]; 4],
    pub light_space: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub light: [f32; 3],
    pub show_shadow: i32,
}

impl Default for UniformBlock {
    fn default() -> Self {
        Self {
            world: Mat4::IDENTITY.to_cols_array_2d(),
            view_projection: Mat4::IDENTITY.to_cols_array_2d(),
            light_space: Mat4::IDENTITY.to_cols_array_2d(),
            color: [1.0; 4],
            light: [0.0; 3],
            show_shadow: 0,
        }
    }
}

impl UniformBlock {
    /// Writes `value` into the slot called `name`.
    ///
    /// The caller has already checked the program declares `name`; an
    /// unknown slot here means the block and the interface disagree.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let type_error = |expected| Error::UniformType {
            name: name.to_string(),
            expected,
        };

        match (name, value) {
            (uniforms::WORLD, UniformValue::Mat4(m)) => self.world = m.to_cols_array_2d(),
            (uniforms::VIEW_PROJECTION, UniformValue::Mat4(m)) => {
                self.view_projection = m.to_cols_array_2d()
            }
            (uniforms::LIGHT_SPACE, UniformValue::Mat4(m)) => {
                self.light_space = m.to_cols_array_2d()
            }
            (uniforms::COLOR, UniformValue::Vec4(v)) => self.color = v.to_array(),
            (uniforms::LIGHT, UniformValue::Vec3(v)) => self.light = v.to_array(),
            (uniforms::SHOW_SHADOW, UniformValue::Int(i)) => self.show_shadow = i,
            (uniforms::WORLD | uniforms::VIEW_PROJECTION | uniforms::LIGHT_SPACE, _) => {
                return Err(type_error("mat4"))
            }
            (uniforms::COLOR, _) => return Err(type_error("vec4")),
            (uniforms::LIGHT, _) => return Err(type_error("vec3")),
            (uniforms::SHOW_SHADOW, _) => return Err(type_error("int")),
            _ => {
                return Err(Error::UniformNotFound {
                    program: "uniform block".to_string(),
                    name: name.to_string(),
                })
            }
        }

        Ok(())
    }

    pub fn world(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.world)
    }

    pub fn view_projection(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.view_projection)
    }

    pub fn light_space(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.light_space)
    }
}
