use anyhow::Context;
use clap::{Parser, Subcommand};
use skyrealm_common::Location;
use skyrealm_kernel::{
    FixedLocation, HISTORY_CAPACITY, LocationSource, Overlay, OverlayEvent, Wanderer,
};
use skyrealm_oracle::{GeminiClient, OracleConfig};
use skyrealm_render::{DebugTextRenderer, Renderer, SceneClock, SceneDescription};
use skyrealm_session::{OverlaySession, SessionConfig};
use skyrealm_tools::OverlayInspector;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skyrealm-cli", about = "CLI tool for the sky realm")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Listen to the wind once and print what it says
    Whisper {
        /// Where to listen (mirror-void, whispering-grass, eroded-ruins)
        #[arg(short, long, default_value = "mirror-void")]
        location: Location,
        /// Print the entry as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a deterministic wander sequence
    Wander {
        /// Number of location changes
        #[arg(short, long, default_value = "10")]
        ticks: u64,
        /// Wanderer seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Describe the scene through the text renderer
    Scene {
        /// Grass scatter seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("skyrealm-cli v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "kernel: location={}, history capacity={HISTORY_CAPACITY}",
                Overlay::new().state().location().slug()
            );
            println!("oracle: {}", skyrealm_oracle::crate_info());
            println!("render: {}", skyrealm_render::crate_info());
            let config = OracleConfig::from_env();
            println!(
                "model: {} (api key {})",
                config.model,
                if config.has_api_key() { "set" } else { "missing" }
            );
        }
        Commands::Whisper { location, json } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("start async runtime")?;
            runtime.block_on(whisper(location, json))?;
        }
        Commands::Wander { ticks, seed } => {
            println!("Wander: seed={seed}, ticks={ticks}");
            let mut wanderer = Wanderer::with_seed(seed);
            let mut overlay = Overlay::new();
            for tick in 1..=ticks {
                let location = wanderer.next_location();
                overlay.apply(OverlayEvent::LocationChanged { location });
                println!("  {tick:>4}: {}", location.slug());
            }

            let replayed = Overlay::replay(overlay.events());
            println!(
                "Final: {} (hash {:016x}, replay {})",
                overlay.state().location(),
                overlay.state().state_hash(),
                if replayed.state().state_hash() == overlay.state().state_hash() {
                    "matches"
                } else {
                    "MISMATCH"
                }
            );
        }
        Commands::Scene { seed } => {
            let scene = SceneDescription::sky_realm(seed);
            let overlay = Overlay::new();
            let frame = DebugTextRenderer::new().render(&scene, overlay.state(), &SceneClock::new());
            print!("{frame}");
        }
    }

    Ok(())
}

/// Run one whisper lifecycle through a session and print the entry.
async fn whisper(location: Location, json: bool) -> anyhow::Result<()> {
    let config = OracleConfig::from_env();
    if !config.has_api_key() {
        tracing::warn!("no API key in API_KEY or GEMINI_API_KEY; expect lost words");
    }
    let generator = Arc::new(GeminiClient::new(config)?);

    let session_config = SessionConfig {
        // The ticker stays on `location`; one interval is longer than any request.
        location_interval: Duration::from_secs(3600),
        seed: None,
    };
    let mut session = OverlaySession::start(
        &session_config,
        generator,
        Box::new(FixedLocation(location)),
        Handle::current(),
    );
    session.move_to(location);
    session.listen();
    session.wait_for_settle().await;
    session.shutdown();

    let state = session.state();
    let entry = state
        .history()
        .first()
        .context("whisper settled without an entry")?;

    if json {
        println!("{}", serde_json::to_string_pretty(entry)?);
    } else {
        println!("[{}] \"{}\"", entry.id.short(), entry.text);
        println!("  at {} ({})", entry.location, entry.created_at.to_rfc3339());
        println!("{}", OverlayInspector::summary(state, session.events()));
    }
    Ok(())
}
