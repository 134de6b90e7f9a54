use std::sync::Once;

static INIT: Once = Once::new();

/// Install the global logger. Later calls are ignored.
///
/// `filter` uses `env_logger` syntax (`"debug"`, `"shadow_scene=debug,wgpu=warn"`).
/// Without one, `RUST_LOG` is read, then `info` is used.
pub fn init_logging(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder
                .filter_level(log::LevelFilter::Info)
                .filter_module("wgpu_core", log::LevelFilter::Warn)
                .filter_module("wgpu_hal", log::LevelFilter::Warn)
                .filter_module("naga", log::LevelFilter::Warn);
        }

        builder.init();
        log::debug!("logging initialized");
    });
}
