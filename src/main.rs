use clap::{Parser, Subcommand};
use portdrop::common::AppConfig;
use portdrop::server::runtime;

#[derive(Parser)]
#[command(name = "portdrop")]
#[command(about = "Share a local file for one-time download via a short numeric code")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the upload/download API server
    Serve {
        /// Override the configured API port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = AppConfig::load()?;
            if let Some(port) = port {
                config.api_port = port;
            }
            runtime::run(config).await
        }
    }
}
