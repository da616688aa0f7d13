//! EcoRoute command-line client entry point.

use clap::Parser;
use ecoroute::{App, Cli};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = App::load_config(&cli)?;
    tracing::info!(
        "Starting ecoroute v{} against {}",
        env!("CARGO_PKG_VERSION"),
        config.api_base_url
    );

    let app = App::new(config)?;
    let output = app.run(cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
