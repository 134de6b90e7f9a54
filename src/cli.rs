use std::path::PathBuf;

use clap::Parser;

use crate::scene::Projection;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "shadow-scene")]
#[command(about = "Interactive shadow mapping demo", long_about = None)]
pub struct Cli {
    /// Initial window width
    #[arg(long)]
    pub width: Option<u32>,

    /// Initial window height
    #[arg(long)]
    pub height: Option<u32>,

    /// Far clip plane, also the depth range of the orthographic projection
    #[arg(long)]
    pub depth: Option<f32>,

    #[arg(long, value_enum)]
    pub projection: Option<Projection>,

    /// Vertical field of view in degrees
    #[arg(long)]
    pub fov: Option<f32>,

    /// JSON file with initial scene values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run without a window, recording render calls
    #[arg(long, default_value = "false")]
    pub headless: bool,

    /// Frames to render in headless mode
    #[arg(long, default_value_t = 8)]
    pub frames: u32,

    /// Log filter, overrides RUST_LOG
    #[arg(long)]
    pub log: Option<String>,
}
