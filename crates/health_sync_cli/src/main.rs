use clap::Parser;
use health_sync_cli::{Cli, init_tracing, run};
use health_sync_core::SyncConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.config(SyncConfig::from_env()?);
    tracing::debug!(
        settings = %config.settings_path.display(),
        log = %config.log_path.display(),
        samples = %config.samples_path.display(),
        "health-sync: resolved paths"
    );

    run(cli.command, &config, &mut std::io::stdout()).await
}
