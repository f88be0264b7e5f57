//! # clipfetch
//!
//! Fetch videos through yt-dlp and scrape short-form video feeds.
//!
//! ## Features
//!
//! - Single video downloads with quality caps or mp3 audio extraction
//! - Metadata lookups with the full format list
//! - Playlist downloads into per-playlist folders
//! - Headless-browser feed scraping with link deduplication
//!
//! ## Example
//!
//! ```rust,no_run
//! use clipfetch::{DownloadRequest, MediaFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = MediaFetcher::new("./downloads")?;
//!
//!     let request = DownloadRequest::new("VIDEO_URL").with_quality("720p");
//!     let result = fetcher.download(&request).await?;
//!     println!("Downloaded: {}", result.file_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod scraper;
pub mod utils;

// Re-export main types
pub use core::{
    DownloadRequest, DownloadResult, Engine, EngineOptions, FormatDescriptor, MediaFetcher,
    PlaylistEntryResult, ProgressEvent, ProgressObserver, QualitySelector, VideoInfo, YtDlp,
};
pub use error::{EngineOp, FetchError};
pub use scraper::{FeedLinks, FeedScraper, ScrapeOptions};

/// Result type alias for clipfetch operations
pub type Result<T> = std::result::Result<T, FetchError>;
