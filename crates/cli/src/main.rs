mod cli;
mod commands;
mod config;
mod utils;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use url::Url;

use vorleser_client::HttpContentClient;
use vorleser_downloads::DownloadCoordinator;
use vorleser_narration::{NarrationEngine, SilentSynthesizer};
use vorleser_reader::{ContentSource, ProgressTracker, ReadingLists, SettingsStore, Statistics};
use vorleser_storage::{FilesystemKv, KeyValueStore, OfflineStore};

use crate::cli::Commands;
use crate::config::Config;

/// Everything the command handlers work against, built once per run.
pub struct App {
    pub config: Config,
    pub client: Arc<HttpContentClient>,
    pub store: Arc<OfflineStore>,
    pub source: Arc<ContentSource>,
    pub engine: Arc<NarrationEngine>,
    pub downloads: DownloadCoordinator,
    pub progress: Arc<ProgressTracker>,
    pub stats: Arc<Statistics>,
    pub settings: Arc<SettingsStore>,
    pub lists: Arc<ReadingLists>,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load().await?;
    let app = build_app(config).await?;

    match cli.command {
        Commands::Search { keyword, limit } => {
            commands::handle_search_command(keyword, limit, &app).await?;
        }
        Commands::Info { novel_id, chapters } => {
            commands::handle_info_command(novel_id, chapters, &app).await?;
        }
        Commands::Download { novel_id, first } => {
            commands::handle_download_command(novel_id, first, &app).await?;
        }
        Commands::Library { command } => {
            commands::handle_library_command(command, &app).await?;
        }
        Commands::Read {
            novel_id,
            chapter,
            narrate,
        } => {
            commands::handle_read_command(novel_id, chapter, narrate, &app).await?;
        }
        Commands::History { clear } => {
            commands::handle_history_command(clear, &app).await?;
        }
        Commands::Continue => {
            commands::handle_continue_command(&app).await?;
        }
        Commands::Lists { command } => {
            commands::handle_list_command(command, &app).await?;
        }
        Commands::Stats { sessions, reset } => {
            commands::handle_stats_command(sessions, reset, &app).await?;
        }
        Commands::Settings { command } => {
            commands::handle_settings_command(command, &app).await?;
        }
        Commands::Config { command } => {
            commands::handle_config_command(command).await?;
        }
    }

    Ok(())
}

async fn build_app(config: Config) -> eyre::Result<App> {
    let base_url = Url::parse(&config.api.base_url)?;
    let kv: Arc<dyn KeyValueStore> = Arc::new(FilesystemKv::new(&config.storage.path));

    let settings = Arc::new(SettingsStore::open(kv.clone()).await?);
    let limits = settings.settings().await.downloads;
    let store = Arc::new(OfflineStore::open(kv.clone(), limits).await?);
    let client = Arc::new(HttpContentClient::new(base_url)?);
    let source = Arc::new(ContentSource::new(store.clone(), client.clone()));

    // Terminal narration has no audio device; the silent synthesizer paces
    // itself at the configured words per minute.
    let delay = Duration::from_millis(60_000 / config.narration.wpm.max(1));
    let synth = Arc::new(SilentSynthesizer::with_delay(delay));
    let engine = Arc::new(NarrationEngine::new(synth));

    let downloads = DownloadCoordinator::new(store.clone(), client.clone());
    let progress = Arc::new(ProgressTracker::open(kv.clone()).await?);
    let stats = Arc::new(Statistics::open(kv.clone()).await?);
    let lists = Arc::new(ReadingLists::open(kv).await?);

    Ok(App {
        config,
        client,
        store,
        source,
        engine,
        downloads,
        progress,
        stats,
        settings,
        lists,
    })
}
