//! Command line argument parsing

use crate::core::{DownloadRequest, YtDlp, DEFAULT_OUTPUT_DIR};
use crate::scraper::{
    ChromiumLauncher, ScrapeOptions, DEFAULT_FEED_URL, DEFAULT_PATH_FILTER,
    DEFAULT_SCROLL_ITERATIONS, DEFAULT_SCROLL_PIXELS,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Container used by quick mode for merged video+audio
pub const QUICK_MERGE_FORMAT: &str = "mp4";

/// Fetch videos through yt-dlp and scrape short-form video feeds
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Extraction engine command (e.g., 'yt-dlp', 'python3 -m yt_dlp')
    #[arg(long = "yt-dlp", value_name = "COMMAND", default_value = "yt-dlp", global = true)]
    pub yt_dlp: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Download one video at best quality, merged to mp4, into the current directory
    Get {
        /// Video URL
        url: String,
    },

    /// Download a video, its audio, or a whole playlist
    Download(DownloadArgs),

    /// Show video metadata and available formats
    Info {
        /// Video URL
        url: String,

        /// Print the metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scroll a feed in a headless browser and list its video links
    Scrape(ScrapeArgs),
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct DownloadArgs {
    /// Video or playlist URL
    pub url: String,

    /// Quality ('best', 'worst', '720p', ...)
    #[arg(short, long, value_name = "QUALITY", default_value = "best")]
    pub quality: String,

    /// Download audio only (mp3, 192 kbps)
    #[arg(short, long)]
    pub audio_only: bool,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,

    /// Output directory
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Treat input as playlist URL
    #[arg(long)]
    pub playlist: bool,
}

#[derive(ClapArgs, Debug, Clone, PartialEq)]
pub struct ScrapeArgs {
    /// Feed URL or channel handle (e.g., '@Zdak')
    #[arg(value_name = "FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// Number of scroll cycles
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SCROLL_ITERATIONS)]
    pub scrolls: u32,

    /// Wheel distance per scroll in pixels
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SCROLL_PIXELS)]
    pub scroll_pixels: i64,

    /// Pause after each scroll (e.g., 1s, 500ms)
    #[arg(long, value_name = "DURATION", default_value = "1s")]
    pub wait: humantime::Duration,

    /// Keep only links containing this text
    #[arg(long, value_name = "TEXT", default_value = DEFAULT_PATH_FILTER)]
    pub filter: String,

    /// Give up if the first page load takes longer than this
    #[arg(long, value_name = "DURATION")]
    pub navigation_timeout: Option<humantime::Duration>,

    /// Path to the Chrome/Chromium binary
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,

    /// Disable the Chromium sandbox
    #[arg(long)]
    pub no_sandbox: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl Args {
    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    /// Build the extraction engine from `--yt-dlp`; a blank command means `yt-dlp`
    pub fn engine(&self) -> YtDlp {
        YtDlp::from_command_line(&self.yt_dlp).unwrap_or_default()
    }
}

impl DownloadArgs {
    /// Check if this is a playlist operation
    pub fn is_playlist(&self) -> bool {
        self.playlist || crate::utils::url::is_playlist_url(&self.url)
    }

    pub fn to_request(&self) -> DownloadRequest {
        DownloadRequest::new(self.url.as_str())
            .with_quality(self.quality.as_str())
            .audio_only(self.audio_only)
            .show_progress(!self.no_progress)
    }
}

impl ScrapeArgs {
    pub fn wait_duration(&self) -> Duration {
        self.wait.into()
    }

    pub fn to_options(&self) -> ScrapeOptions {
        ScrapeOptions::new(crate::utils::url::feed_url(&self.feed_url))
            .with_scroll_iterations(self.scrolls)
            .with_scroll_pixels(self.scroll_pixels)
            .with_wait_per_scroll(self.wait_duration())
            .with_path_filter(self.filter.as_str())
            .with_navigation_timeout(self.navigation_timeout.map(Duration::from))
    }

    pub fn launcher(&self) -> ChromiumLauncher {
        let mut launcher = ChromiumLauncher::new();
        if let Some(path) = &self.chrome {
            launcher = launcher.with_executable(path);
        }
        if self.no_sandbox {
            launcher = launcher.without_sandbox();
        }
        launcher
    }
}

/// Quick-mode request: best video and audio merged into mp4
pub fn quick_request(url: &str) -> DownloadRequest {
    DownloadRequest::new(url).merge_into(QUICK_MERGE_FORMAT)
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QualitySelector;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("clipfetch").chain(argv.iter().copied())).unwrap()
    }

    fn download_args(argv: &[&str]) -> DownloadArgs {
        match parse(argv).command {
            Command::Download(args) => args,
            other => panic!("expected download, got {:?}", other),
        }
    }

    fn scrape_args(argv: &[&str]) -> ScrapeArgs {
        match parse(argv).command {
            Command::Scrape(args) => args,
            other => panic!("expected scrape, got {:?}", other),
        }
    }

    #[test]
    fn test_args_verbosity_level() {
        let args = parse(&["get", "https://example.com"]);
        assert_eq!(args.verbosity_level(), VerbosityLevel::Normal);
        assert_eq!(args.default_log_filter(), "warn");

        let args = parse(&["--quiet", "get", "https://example.com"]);
        assert_eq!(args.verbosity_level(), VerbosityLevel::Quiet);

        let args = parse(&["get", "https://example.com", "-v"]);
        assert_eq!(args.verbosity_level(), VerbosityLevel::Verbose);
        assert_eq!(args.default_log_filter(), "debug");
    }

    #[test]
    fn test_get_subcommand() {
        let args = parse(&["get", "https://youtu.be/abc"]);
        assert_eq!(
            args.command,
            Command::Get {
                url: "https://youtu.be/abc".to_string()
            }
        );
    }

    #[test]
    fn test_quick_request() {
        let request = quick_request("https://youtu.be/abc");
        assert_eq!(request.quality, QualitySelector::Best);
        assert_eq!(request.merge_output_format.as_deref(), Some("mp4"));
        assert!(!request.audio_only);
        assert!(request.show_progress);
    }

    #[test]
    fn test_download_defaults() {
        let args = download_args(&["download", "https://youtu.be/abc"]);
        assert_eq!(args.quality, "best");
        assert_eq!(args.output, PathBuf::from("downloads"));
        assert!(!args.audio_only);
        assert!(!args.no_progress);
        assert!(!args.is_playlist());

        let request = args.to_request();
        assert_eq!(request.quality, QualitySelector::Best);
        assert!(request.show_progress);
        assert_eq!(request.merge_output_format, None);
    }

    #[test]
    fn test_download_custom_values() {
        let args = download_args(&[
            "download",
            "https://youtu.be/abc",
            "-q",
            "720p",
            "--audio-only",
            "--no-progress",
            "-o",
            "/tmp/media",
        ]);

        assert_eq!(args.output, PathBuf::from("/tmp/media"));
        let request = args.to_request();
        assert_eq!(request.url, "https://youtu.be/abc");
        assert_eq!(request.quality, QualitySelector::Height(720));
        assert!(request.audio_only);
        assert!(!request.show_progress);
    }

    #[test]
    fn test_download_is_playlist() {
        let args = download_args(&["download", "https://www.youtube.com/playlist?list=PLxxxx"]);
        assert!(args.is_playlist());

        let args = download_args(&["download", "https://www.youtube.com/watch?v=xxx", "--playlist"]);
        assert!(args.is_playlist());
    }

    #[test]
    fn test_info_subcommand() {
        let args = parse(&["info", "https://youtu.be/abc", "--json"]);
        assert_eq!(
            args.command,
            Command::Info {
                url: "https://youtu.be/abc".to_string(),
                json: true
            }
        );
    }

    #[test]
    fn test_scrape_defaults() {
        let args = scrape_args(&["scrape"]);
        assert_eq!(args.to_options(), ScrapeOptions::default());

        let launcher = args.launcher();
        assert!(launcher.executable.is_none());
        assert!(launcher.sandbox);
    }

    #[test]
    fn test_scrape_custom_values() {
        let args = scrape_args(&[
            "scrape",
            "@someone",
            "--scrolls",
            "3",
            "--scroll-pixels",
            "500",
            "--wait",
            "250ms",
            "--filter",
            "/watch",
            "--navigation-timeout",
            "1m",
            "--chrome",
            "/usr/bin/chromium",
            "--no-sandbox",
        ]);

        let options = args.to_options();
        assert_eq!(options.feed_url, "https://www.youtube.com/@someone/shorts");
        assert_eq!(options.scroll_iterations, 3);
        assert_eq!(options.scroll_pixels, 500);
        assert_eq!(options.wait_per_scroll, Duration::from_millis(250));
        assert_eq!(options.path_filter, "/watch");
        assert_eq!(options.navigation_timeout, Some(Duration::from_secs(60)));

        let launcher = args.launcher();
        assert_eq!(
            launcher.executable.as_deref(),
            Some(std::path::Path::new("/usr/bin/chromium"))
        );
        assert!(!launcher.sandbox);
    }

    #[test]
    fn test_engine_command() {
        let args = parse(&["info", "https://youtu.be/abc"]);
        assert_eq!(args.engine().program(), "yt-dlp");

        let args = parse(&["--yt-dlp", "python3 -m yt_dlp", "info", "https://youtu.be/abc"]);
        assert_eq!(args.engine().program(), "python3");

        let args = parse(&["--yt-dlp", " ", "info", "https://youtu.be/abc"]);
        assert_eq!(args.engine().program(), "yt-dlp");
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Args::try_parse_from(["clipfetch"]).is_err());
        assert!(Args::try_parse_from(["clipfetch", "download"]).is_err());
    }
}
