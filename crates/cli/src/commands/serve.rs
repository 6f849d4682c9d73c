use std::net::SocketAddr;
use zeorun_config::Settings;
use zeorun_runner::{Runner, RunnerConfig, SystemProcessExecutor};

pub async fn execute(mut settings: Settings, bind: Option<SocketAddr>) -> eyre::Result<()> {
    if let Some(bind) = bind {
        settings.server.bind = bind;
    }

    let runner = Runner::new(
        SystemProcessExecutor::new(settings.runner.tool_path.clone()),
        RunnerConfig::from_settings(&settings)?,
    )?;

    crate::server::serve(runner, &settings.server).await
}
