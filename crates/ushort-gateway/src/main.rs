use clap::Parser;
use ushort_gateway::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _telemetry = ushort_telemetry::init(cli.telemetry_config())?;

    ushort_gateway::run(cli).await
}
