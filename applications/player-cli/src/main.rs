/// Orpheon Player - headless listening sessions
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use orpheon_core::{Track, TrackId};
use orpheon_player::{
    catalog::load_catalog, parse_script, PlayerConfig, Session, SessionReporter,
};
use orpheon_playback::{FileStore, PlaybackStateStore};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "orpheon-player")]
#[command(about = "Headless Orpheon player", long_about = None)]
struct Cli {
    /// Configuration file path (default: ./orpheon.toml if present)
    #[arg(short, long, global = true, env = "ORPHEON_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session from a catalog file
    Play {
        /// JSON array of tracks (album or search listing)
        #[arg(long)]
        catalog: PathBuf,

        /// Track to start with (default: first in the catalog)
        #[arg(short, long)]
        track: Option<String>,

        #[command(flatten)]
        script: ScriptArgs,
    },
    /// Continue the persisted session
    Resume {
        /// Catalog that `queue:<id>` actions pick tracks from
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[command(flatten)]
        script: ScriptArgs,
    },
    /// Print the persisted player state
    State,
    /// Delete the persisted player state
    Reset,
}

#[derive(Args)]
struct ScriptArgs {
    /// Simulated clock step in seconds
    #[arg(long, default_value_t = orpheon_player::session::DEFAULT_STEP_SECS)]
    step: f64,

    /// Actions: tick:<s> seek:<s> volume:<0-1> queue:<id> toggle next prev
    actions: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orpheon_player=info,orpheon_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = PlayerConfig::load(cli.config.as_deref())?;
    config.validate()?;

    match cli.command {
        Commands::Play {
            catalog,
            track,
            script,
        } => {
            let catalog = load_catalog(&catalog)
                .with_context(|| format!("loading catalog {}", catalog.display()))?;
            let track = track.as_deref().map(TrackId::parse).transpose()?;
            run_session(&config, catalog, Start::Fresh(track), script).await?;
        }
        Commands::Resume { catalog, script } => {
            let catalog = match catalog {
                Some(path) => load_catalog(&path)
                    .with_context(|| format!("loading catalog {}", path.display()))?,
                None => Vec::new(),
            };
            run_session(&config, catalog, Start::Resume, script).await?;
        }
        Commands::State => {
            let store = open_store(&config)?;
            println!("{}", serde_json::to_string_pretty(store.state())?);
        }
        Commands::Reset => {
            let mut store = open_store(&config)?;
            store.clear()?;
            tracing::info!(dir = %config.storage.data_dir.display(), "Player state cleared");
        }
    }

    Ok(())
}

enum Start {
    /// New session from the given track (or the first of the catalog)
    Fresh(Option<TrackId>),
    /// Continue the persisted session
    Resume,
}

/// Run a session and print its summary
async fn run_session(
    config: &PlayerConfig,
    catalog: Vec<Track>,
    start: Start,
    script: ScriptArgs,
) -> anyhow::Result<()> {
    let actions = parse_script(script.actions.iter().map(String::as_str))?;

    let reporter = SessionReporter::from_config(config)?;
    let mut session = Session::open(config, catalog, reporter.clone())?.with_step(script.step);

    if let Start::Fresh(first) = start {
        session.start(first.as_ref())?;
    } else if session.player().state().current_track.is_none() {
        anyhow::bail!("no persisted session to resume; use `play --catalog <file>`");
    }

    for action in &actions {
        session.apply(action)?;
    }

    let summary = session.finish();
    reporter.settle().await;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn open_store(config: &PlayerConfig) -> anyhow::Result<PlaybackStateStore> {
    let storage = FileStore::open(&config.storage.data_dir)?;
    Ok(PlaybackStateStore::open(Box::new(storage), &config.playback))
}
