mod logging;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{error, warn};

use hikari_api::BiliClient;
use hikari_core::config::AppConfig;
use hikari_runtime::{BangumiInfoService, ImageCache, ServiceOptions};

/// Look up a Bilibili bangumi season and list its episodes.
#[derive(Debug, Parser)]
#[command(name = "hikari", version, about)]
struct Cli {
    /// Season/episode/media id (ss123, ep456, md789) or a bangumi URL.
    input: String,

    /// Print the section tree instead of the main episode list.
    #[arg(short, long)]
    sections: bool,

    /// Resolve the stream of the given 1-based main-list episode.
    #[arg(long, value_name = "ORDER")]
    stream: Option<usize>,

    /// Print the season overview (stats, uploader, cached cover).
    #[arg(long)]
    view: bool,

    /// Emit JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Use this config file instead of the per-user one.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Debug logging (ignored when RUST_LOG is set).
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("hikari: failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(&config.logging, cli.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("hikari: failed to initialise logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    run(cli, config).await
}

async fn run(cli: Cli, config: AppConfig) -> ExitCode {
    let client = match BiliClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build API client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let images = match ImageCache::open(config.cache_dir(), reqwest::Client::new()) {
        Ok(images) => images,
        Err(e) => {
            error!("Failed to open image cache: {e}");
            return ExitCode::FAILURE;
        }
    };

    let service = BangumiInfoService::new(
        &cli.input,
        client,
        images,
        ServiceOptions::from_config(&config),
    )
    .await;

    let found = service.season().is_some();

    if let Some(order) = cli.stream {
        let Some(mut page) = service.video_pages().into_iter().find(|p| p.order == order) else {
            error!(order, "No such episode in the main list");
            return ExitCode::FAILURE;
        };
        if let Err(e) = service.resolve_stream_info(&mut page).await {
            error!("{e}");
            return ExitCode::FAILURE;
        }
        emit(cli.json, &page, output::render_stream);
        return ExitCode::SUCCESS;
    }

    if cli.view {
        let (tx, rx) = oneshot::channel();
        if service.publish_video_view(tx).await {
            if let Ok(view) = rx.await {
                emit(cli.json, &view, output::render_view);
            }
        }
    } else if cli.sections {
        match service.video_sections() {
            Some(sections) => emit(cli.json, &sections, |s| output::render_sections(s)),
            None => emit(cli.json, &service.video_pages(), |p| output::render_pages(p)),
        }
    } else {
        emit(cli.json, &service.video_pages(), |p| output::render_pages(p));
    }

    if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, render: impl Fn(&T) -> String) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(e) => warn!("Failed to serialise output: {e}"),
        }
    } else {
        print!("{}", render(value));
    }
}
