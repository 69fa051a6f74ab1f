mod app;
mod cli;

use app::App;
use clap::Parser;
use cli::{Cli, Command};
use tracing::info;
use tracing_subscriber::EnvFilter;
use visearch_experiment::{IconPool, SessionMeta, SessionRecorder};
use visearch_render::load_font;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if let Some(Command::NewConfig(args)) = &cli.command {
        cli::new_config(&cli.config_dir, args.clone())?;
        return Ok(());
    }

    let loaded = cli::resolve_config(&cli)?;
    let participant = cli::participant(&cli)?;
    info!(participant = %participant.id, config = %loaded.path.display(), "session prepared");

    let mut config = loaded.config.clone();
    if cli.windowed {
        config.display.fullscreen = false;
    }

    let icons = IconPool::scan(&cli.icons_dir, &config);
    let font = load_font(cli.font.as_deref());
    let meta = SessionMeta::new(participant, loaded.path.clone());
    let recorder = SessionRecorder::new(meta, &loaded, &cli.output_dir);

    let app = App::new(config, recorder, icons, font, cli.icons_dir.clone());
    app.run()?;

    Ok(())
}
