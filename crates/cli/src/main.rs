use clap::Parser;
use std::path::PathBuf;
use zeorun::commands::Commands;
use zeorun_config::SettingsLoader;

#[derive(Parser)]
#[command(name = "zeorun")]
#[command(about = "Cached, single-flight runner for Zeo++ network analyses", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings file (defaults to $XDG_CONFIG_HOME/zeorun/config.json)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    zeorun_utils::tracing::init(cli.verbose).map_err(|e| eyre::eyre!(e))?;

    let mut loader = SettingsLoader::new();
    if let Some(path) = cli.config {
        loader = loader.file(path);
    }
    let settings = loader.load()?;

    cli.command.execute(settings).await
}
