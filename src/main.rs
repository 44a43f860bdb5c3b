use aurora::{App, Config, Database, Profile, assistant::Assistant, cli::{Cli, Commands}};
use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("AURORA_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    let config = match &cli.config {
        Some(path) => Config::load_from_path(&PathBuf::from(path), profile)?,
        None => Config::load_with_profile(profile)?,
    };

    let db_path = config.get_database_path();
    let db = Database::new(
        db_path.to_str()
            .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?
    )?;

    let mut app = App::new(db, aurora::utils::today());
    let assistant = Assistant::from_config(&config.assistant);

    let command = cli.command.unwrap_or(Commands::Dashboard);
    aurora::cli::run(command, &mut app, &assistant).await?;

    Ok(())
}
