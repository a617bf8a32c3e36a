//! Shellpilot CLI entry point.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use pilot_events::TurnBus;
use pilot_oracle::ChatOracle;
use pilot_orchestrator::PilotLoop;

use shellpilot::cli::{Cli, Commands};
use shellpilot::printer;

#[tokio::main]
async fn main() {
    // Load .env if present (for OPENAI_API_KEY etc.)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let oracle = Arc::new(ChatOracle::from_env()?);
    let bus = TurnBus::default();
    let printer = printer::spawn_printer(&bus);

    let mut pilot = PilotLoop::new(oracle, bus);

    // Ctrl-C requests cooperative cancellation; the run halts at its next
    // suspension point without killing the container.
    let handle = pilot.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });

    let result = match cli.command {
        Commands::Run { goal, image } => pilot.start(&goal, &image).await,
        Commands::Exec { command, image } => pilot.run_direct(&image, &command).await,
    };

    pilot.shutdown().await;
    drop(pilot);
    let _ = printer.await;

    result.map_err(Into::into)
}
