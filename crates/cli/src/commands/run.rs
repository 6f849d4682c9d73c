use bytes::Bytes;
use clap::Args;
use eyre::{eyre, WrapErr};
use std::path::PathBuf;
use std::time::Duration;
use zeorun_analysis::{staged_input_name, Operation, OperationKind, OperationParams};
use zeorun_config::Settings;
use zeorun_runner::{RunRequest, Runner, RunnerConfig, SystemProcessExecutor};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Operation id (see `zeorun operations`)
    pub operation: OperationKind,

    /// Structure file; the extension selects the tool's reader
    pub file: PathBuf,

    /// Channel radius for accessibility tests
    #[arg(long)]
    pub chan_radius: Option<f64>,

    /// Probe radius for Monte Carlo sampling
    #[arg(long)]
    pub probe_radius: Option<f64>,

    /// Monte Carlo samples per atom (or in total for blocking spheres)
    #[arg(long)]
    pub samples: Option<u32>,

    /// Disable high accuracy mode
    #[arg(long)]
    pub no_ha: bool,

    /// Treat atoms as points when exporting the Voronoi network
    #[arg(long)]
    pub no_radii: bool,

    /// Timeout in seconds, overrides the configured default
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the raw output file instead of the decoded record
    #[arg(long)]
    pub raw: bool,
}

impl RunArgs {
    fn params(&self) -> OperationParams {
        OperationParams {
            high_accuracy: self.no_ha.then_some(false),
            chan_radius: self.chan_radius,
            probe_radius: self.probe_radius,
            samples: self.samples,
            use_radii: self.no_radii.then_some(false),
        }
    }
}

pub async fn execute(args: RunArgs, settings: Settings) -> eyre::Result<()> {
    let operation = Operation::from_params(args.operation, &args.params())?;

    let upload_name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| eyre!("'{}' does not name a file", args.file.display()))?;
    let staged = staged_input_name(upload_name)?;
    let structure = tokio::fs::read(&args.file)
        .await
        .wrap_err_with(|| format!("failed to read {}", args.file.display()))?;

    let runner = Runner::new(
        SystemProcessExecutor::new(settings.runner.tool_path.clone()),
        RunnerConfig::from_settings(&settings)?,
    )?;

    let mut request = RunRequest::for_operation(&operation, Bytes::from(structure), staged);
    if let Some(secs) = args.timeout {
        request.timeout = Some(Duration::from_secs(secs));
    }

    let response = runner.run(request).await?;
    if !response.success() {
        let reason = response
            .result
            .failure
            .as_ref()
            .map(|f| f.label())
            .unwrap_or("unknown");
        eprintln!("Zeo++ failed ({reason})");
        eprint!("{}", response.stderr());
        std::process::exit(1);
    }

    if args.raw {
        print!(
            "{}",
            response.result.output_text(operation.kind().output_file())?
        );
    } else {
        let report = operation.decode(&response.result)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
