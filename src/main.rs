use clap::Parser;
use service_probes::ProbeError;
use service_probes::cli::{self, Cli};
use service_probes::{config, telemetry};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ProbeError> {
    config::load_dotenv()?;

    let cli = Cli::parse();
    telemetry::init(cli.log_level.as_deref());

    cli::run(cli.command).await
}
