use anyhow::Result;
use clap::Parser;

use shadow_scene::app;
use shadow_scene::cli::Cli;
use shadow_scene::config::DemoConfig;
use shadow_scene::logging::init_logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let config = DemoConfig::from_cli(&cli)?;
    if cli.headless {
        return app::run_headless(&config, cli.frames);
    }

    app::run(config)
}
