pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod core;
pub mod geometry;
pub mod logging;
pub mod material;
pub mod math;
pub mod scene;
pub mod shadow;
pub mod shape;
pub mod ui;

pub use camera::Camera;
pub use core::{Error, Result};
pub use material::{Material, PassContext, PassKind, ShadowMode};
pub use scene::{Projection, Scene, SceneSize, ShapeId};
pub use shadow::{Control, ControlTarget, ShadowDemo};
pub use shape::Shape;
