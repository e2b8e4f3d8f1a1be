use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use starryspot::{RecommendationFlow, RecommendationRequest, StarrySpotConfig, StarrySpotError};

#[derive(Parser, Debug)]
#[command(name = "starryspot", version)]
#[command(about = "Recommends a nearby star-gazing spot from live weather and light-pollution data")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recommend a viewing location near the given position
    Recommend {
        #[arg(long, allow_negative_numbers = true)]
        latitude: f64,

        #[arg(long, allow_negative_numbers = true)]
        longitude: f64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP API
    Serve {
        /// Overrides server.port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            match e.downcast_ref::<StarrySpotError>() {
                Some(err) => eprintln!("{}", err.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = StarrySpotConfig::load_from_path(cli.config)?;
    starryspot::logging::init_logging(&config.logging, cli.verbose)?;
    tracing::debug!("Loaded configuration: {:?}", config);

    let flow = RecommendationFlow::from_config(&config)
        .with_context(|| "Failed to set up the recommendation flow")?;

    match cli.command {
        Commands::Recommend {
            latitude,
            longitude,
            json,
        } => recommend(&flow, RecommendationRequest::new(latitude, longitude), json).await,
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            starryspot::web::run(port, Arc::new(flow)).await
        }
    }
}

async fn recommend(
    flow: &RecommendationFlow,
    request: RecommendationRequest,
    json: bool,
) -> Result<()> {
    let user = request.coordinates()?;
    let result = flow.recommend(request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let spot = result.coordinates()?;
    println!("{}", result.location_name);
    println!(
        "  {} ({:.1} km from {})",
        spot.format_coordinates(),
        user.distance_km(&spot),
        user.format_coordinates()
    );
    println!("  {}", result.reason);
    Ok(())
}
