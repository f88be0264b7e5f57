//! Main entry point for the clipfetch CLI

use clap::Parser;
use clipfetch::cli::args::{quick_request, DownloadArgs, ScrapeArgs};
use clipfetch::cli::{Args, Command, OutputFormatter};
use clipfetch::core::{MediaFetcher, YtDlp};
use clipfetch::scraper::FeedScraper;
use clipfetch::Result;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse();

    init_logging(args.default_log_filter());
    debug!("Starting clipfetch with args: {:?}", args);

    let formatter = OutputFormatter::new(args.verbosity_level());

    match run(&args, &formatter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatter.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args, formatter: &OutputFormatter) -> Result<()> {
    let engine = args.engine();

    match &args.command {
        Command::Get { url } => handle_quick_download(engine, url, formatter).await,
        Command::Download(download) if download.is_playlist() => {
            handle_playlist_download(engine, download, formatter).await
        }
        Command::Download(download) => handle_single_download(engine, download, formatter).await,
        Command::Info { url, json } => handle_info(engine, url, *json, formatter).await,
        Command::Scrape(scrape) => handle_scrape(scrape, formatter).await,
    }
}

/// Quick mode: best quality merged to mp4 in the current directory
async fn handle_quick_download(engine: YtDlp, url: &str, formatter: &OutputFormatter) -> Result<()> {
    let fetcher = MediaFetcher::with_engine(".", engine)?;
    fetcher.download(&quick_request(url)).await?;
    formatter.success("Download complete!");
    Ok(())
}

async fn handle_single_download(
    engine: YtDlp,
    download: &DownloadArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let start_time = Instant::now();
    let fetcher = MediaFetcher::with_engine(&download.output, engine)?;

    let result = fetcher.download(&download.to_request()).await?;
    info!("Download finished in {:?}", start_time.elapsed());

    formatter.print_download_result(&result);
    formatter.success("Download complete!");
    Ok(())
}

async fn handle_playlist_download(
    engine: YtDlp,
    download: &DownloadArgs,
    formatter: &OutputFormatter,
) -> Result<()> {
    let start_time = Instant::now();
    let fetcher = MediaFetcher::with_engine(&download.output, engine)?;

    formatter.info(&format!("Downloading playlist {}", download.url));
    let entries = fetcher.download_playlist(&download.to_request()).await?;
    info!(
        "Playlist finished: {} entries in {:?}",
        entries.len(),
        start_time.elapsed()
    );

    formatter.print_playlist_entries(&entries);
    formatter.success("Download complete!");
    Ok(())
}

async fn handle_info(engine: YtDlp, url: &str, json: bool, formatter: &OutputFormatter) -> Result<()> {
    // Lookups write nothing; point the fetcher at a directory that already exists
    let fetcher = MediaFetcher::with_engine(std::env::temp_dir(), engine)?.without_observer();
    let info = fetcher.get_info(url).await?;

    if json {
        formatter.print_json(&info)
    } else {
        formatter.print_video_info(&info);
        Ok(())
    }
}

async fn handle_scrape(scrape: &ScrapeArgs, formatter: &OutputFormatter) -> Result<()> {
    let options = scrape.to_options();
    if !scrape.json {
        formatter.info(&format!("Scraping {}", options.feed_url));
    }

    let scraper = FeedScraper::with_launcher(scrape.launcher());
    let links = scraper.scrape(&options).await?;

    if scrape.json {
        formatter.print_json(&links)
    } else {
        formatter.print_feed_links(&links);
        Ok(())
    }
}

/// Initialize logging system
fn init_logging(default_filter: &str) {
    // RUST_LOG wins over the verbosity flags
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
