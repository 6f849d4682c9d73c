use clap::Subcommand;
use std::net::SocketAddr;
use zeorun_config::Settings;

pub mod operations;
pub mod run;
pub mod serve;

use self::run::RunArgs;

#[derive(Subcommand)]
pub enum Commands {
    /// Run one analysis on a structure file and print the result as JSON
    Run(RunArgs),

    /// List the supported operations
    #[command(visible_alias = "ops")]
    Operations,

    /// Serve analyses over HTTP
    Serve {
        /// Listen address, overrides the configured one
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
}

impl Commands {
    pub async fn execute(self, settings: Settings) -> eyre::Result<()> {
        match self {
            Commands::Run(args) => run::execute(args, settings).await,
            Commands::Operations => {
                operations::execute();
                Ok(())
            }
            Commands::Serve { bind } => serve::execute(settings, bind).await,
        }
    }
}
