//! Terminal output formatting

use crate::cli::args::VerbosityLevel;
use crate::core::progress::{format_bytes, format_duration};
use crate::core::{DownloadResult, FormatDescriptor, PlaylistEntryResult, VideoInfo};
use crate::scraper::FeedLinks;
use crate::Result;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::IsTerminal;
use std::time::Duration;

/// Placeholder for metadata the engine did not report
const UNKNOWN: &str = "unknown";

/// Output formatter for clipfetch
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{}", message.green());
        }
    }

    /// Print error message, always shown
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", error_prefix(std::io::stderr().is_terminal()), message);
    }

    /// Print video information and its format table
    pub fn print_video_info(&self, info: &VideoInfo) {
        print!("{}", render_video_info(info));
    }

    /// Print where a download ended up
    pub fn print_download_result(&self, result: &DownloadResult) {
        if self.verbosity != VerbosityLevel::Quiet {
            print!("{}", render_download_result(result));
        }
    }

    /// Print playlist entries
    pub fn print_playlist_entries(&self, entries: &[PlaylistEntryResult]) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("{}", format!("Downloaded {} entries", entries.len()).bold());
        }
        print!("{}", render_playlist_entries(entries));
    }

    /// Print scraped links, count first
    pub fn print_feed_links(&self, links: &FeedLinks) {
        print!("{}", render_feed_links(links));
    }

    /// Print any result as pretty JSON
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// `Error:` label, colored only when stderr is a terminal.
/// `colored` decides from stdout, so a redirected stderr needs the plain form.
pub fn error_prefix(colorize: bool) -> String {
    if colorize {
        "Error:".red().bold().to_string()
    } else {
        "Error:".to_string()
    }
}

/// Human-readable length of a video given in seconds
pub fn display_duration(seconds: Option<f64>) -> String {
    seconds
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .map(format_duration)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn render_video_info(info: &VideoInfo) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Title:    {}", info.title.as_deref().unwrap_or(UNKNOWN));
    let _ = writeln!(out, "Duration: {}", display_duration(info.duration_seconds));
    let _ = writeln!(out, "Uploader: {}", info.uploader.as_deref().unwrap_or(UNKNOWN));
    if let Some(views) = info.view_count {
        let _ = writeln!(out, "Views:    {}", views);
    }
    if let Some(thumbnail) = &info.thumbnail_url {
        let _ = writeln!(out, "Thumb:    {}", thumbnail);
    }

    let _ = writeln!(out, "Formats:  {}", info.formats.len());
    let known_size = info.total_known_size();
    if known_size > 0 {
        let _ = writeln!(out, "Sizes:    {} known in total", format_bytes(known_size));
    }
    for format in &info.formats {
        let _ = writeln!(out, "  {}", render_format(format));
    }

    out
}

fn render_format(format: &FormatDescriptor) -> String {
    let size = format
        .filesize_bytes
        .map(format_bytes)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<10} {:<6} {:<12} {}",
        format.format_id.as_deref().unwrap_or("?"),
        format.extension.as_deref().unwrap_or("?"),
        format.resolution.as_deref().unwrap_or("?"),
        size
    )
}

pub fn render_download_result(result: &DownloadResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Title:    {}", result.title.as_deref().unwrap_or(UNKNOWN));
    let _ = writeln!(out, "Duration: {}", display_duration(result.duration_seconds));
    let _ = writeln!(out, "Uploader: {}", result.uploader.as_deref().unwrap_or(UNKNOWN));
    let _ = writeln!(out, "Saved to: {}", result.file_path.display());
    out
}

pub fn render_playlist_entries(entries: &[PlaylistEntryResult]) -> String {
    let mut out = String::new();
    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "[{}/{}] {} {}",
            index + 1,
            entries.len(),
            entry.title.as_deref().unwrap_or(UNKNOWN),
            entry.url.as_deref().unwrap_or("")
        );
    }
    out
}

/// `Found: <matches>` followed by one unique link per line
pub fn render_feed_links(links: &FeedLinks) -> String {
    let mut out = format!("Found: {}\n", links.total_matches);
    for link in &links.links {
        out.push_str(link);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_info() -> VideoInfo {
        VideoInfo {
            title: Some("Test Video".to_string()),
            duration_seconds: Some(90.0),
            uploader: Some("Test Author".to_string()),
            description: None,
            view_count: Some(1234),
            thumbnail_url: None,
            formats: vec![
                FormatDescriptor {
                    format_id: Some("137".to_string()),
                    extension: Some("mp4".to_string()),
                    resolution: Some("1920x1080".to_string()),
                    filesize_bytes: Some(1048576),
                },
                FormatDescriptor {
                    format_id: Some("140".to_string()),
                    extension: Some("m4a".to_string()),
                    resolution: Some("audio only".to_string()),
                    filesize_bytes: None,
                },
            ],
        }
    }

    #[test]
    fn test_output_formatter_creation() {
        let formatter = OutputFormatter::new(VerbosityLevel::Normal);
        assert_eq!(formatter.verbosity(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_error_prefix_plain_when_not_a_terminal() {
        assert_eq!(error_prefix(false), "Error:");

        colored::control::set_override(true);
        let colored_prefix = error_prefix(true);
        colored::control::unset_override();
        assert!(colored_prefix.contains("Error:"));
        assert!(colored_prefix.contains('\x1b'));
    }

    #[test]
    fn test_display_duration() {
        assert_eq!(display_duration(Some(30.0)), "30s");
        assert_eq!(display_duration(Some(90.4)), "1m 30s");
        assert_eq!(display_duration(Some(3660.0)), "1h 1m");
        assert_eq!(display_duration(None), "unknown");
        assert_eq!(display_duration(Some(-1.0)), "unknown");
        assert_eq!(display_duration(Some(f64::NAN)), "unknown");
    }

    #[test]
    fn test_render_video_info() {
        let text = render_video_info(&sample_info());

        assert!(text.contains("Title:    Test Video"));
        assert!(text.contains("Duration: 1m 30s"));
        assert!(text.contains("Uploader: Test Author"));
        assert!(text.contains("Views:    1234"));
        assert!(text.contains("Formats:  2"));
        assert!(text.contains("Sizes:    1.0 MB known in total"));
        assert!(!text.contains("Thumb:"));

        let lines: Vec<&str> = text.lines().filter(|l| l.starts_with("  ")).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].trim_start().starts_with("137"));
        assert!(lines[1].contains("audio only"));
        assert!(lines[1].trim_end().ends_with('-'));
    }

    #[test]
    fn test_render_video_info_missing_fields() {
        let info = VideoInfo {
            title: None,
            duration_seconds: None,
            uploader: None,
            description: None,
            view_count: None,
            thumbnail_url: None,
            formats: vec![],
        };

        let text = render_video_info(&info);
        assert!(text.contains("Title:    unknown"));
        assert!(text.contains("Formats:  0"));
        assert!(!text.contains("Views:"));
        assert!(!text.contains("Sizes:"));
    }

    #[test]
    fn test_render_download_result() {
        let result = DownloadResult {
            title: Some("Clip".to_string()),
            duration_seconds: Some(12.0),
            uploader: None,
            file_path: PathBuf::from("downloads/Clip.mp4"),
        };

        let text = render_download_result(&result);
        assert!(text.contains("Title:    Clip"));
        assert!(text.contains("Duration: 12s"));
        assert!(text.contains("Uploader: unknown"));
        assert!(text.contains("Saved to: downloads/Clip.mp4"));
    }

    #[test]
    fn test_render_playlist_entries() {
        let entries = vec![
            PlaylistEntryResult {
                title: Some("One".to_string()),
                url: Some("https://x/1".to_string()),
            },
            PlaylistEntryResult {
                title: None,
                url: None,
            },
        ];

        let text = render_playlist_entries(&entries);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["[1/2] One https://x/1", "[2/2] unknown "]);
        assert_eq!(render_playlist_entries(&[]), "");
    }

    #[test]
    fn test_render_feed_links() {
        let links = FeedLinks {
            links: vec!["https://x/shorts/1".to_string(), "https://x/shorts/2".to_string()],
            total_matches: 3,
        };

        assert_eq!(
            render_feed_links(&links),
            "Found: 3\nhttps://x/shorts/1\nhttps://x/shorts/2\n"
        );
        assert_eq!(render_feed_links(&FeedLinks::default()), "Found: 0\n");
    }

    #[test]
    fn test_print_json() {
        let formatter = OutputFormatter::new(VerbosityLevel::Quiet);
        assert!(formatter.print_json(&sample_info()).is_ok());
    }
}
