//! Result structures and engine payload mapping

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of a single download
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadResult {
    /// Video title
    pub title: Option<String>,
    /// Video duration in seconds
    pub duration_seconds: Option<f64>,
    /// Uploader name
    pub uploader: Option<String>,
    /// Where the engine put the final file
    pub file_path: PathBuf,
}

/// Video information and metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoInfo {
    /// Video title
    pub title: Option<String>,
    /// Video duration in seconds
    pub duration_seconds: Option<f64>,
    /// Uploader name
    pub uploader: Option<String>,
    /// Video description
    pub description: Option<String>,
    /// Video view count
    pub view_count: Option<u64>,
    /// Video thumbnail URL
    pub thumbnail_url: Option<String>,
    /// Available formats, in engine order
    pub formats: Vec<FormatDescriptor>,
}

/// Video format information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatDescriptor {
    /// Engine format ID (e.g., "137")
    pub format_id: Option<String>,
    /// Container extension (e.g., "mp4")
    pub extension: Option<String>,
    /// Resolution label (e.g., "1920x1080", "audio only")
    pub resolution: Option<String>,
    /// File size in bytes (if known)
    pub filesize_bytes: Option<u64>,
}

/// Playlist item information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistEntryResult {
    /// Video title
    pub title: Option<String>,
    /// Video page URL
    pub url: Option<String>,
}

/// The subset of the engine's info payload we read.
///
/// Every field is optional: extractors differ in what they report.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawInfo {
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub description: Option<String>,
    pub view_count: Option<u64>,
    pub thumbnail: Option<String>,
    pub webpage_url: Option<String>,
    pub ext: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<RawFormat>>,
    #[serde(default)]
    pub entries: Option<Vec<Option<RawInfo>>>,
    #[serde(default)]
    pub requested_downloads: Option<Vec<RawRequestedDownload>>,
    #[serde(rename = "_filename")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawFormat {
    pub format_id: Option<String>,
    pub ext: Option<String>,
    pub resolution: Option<String>,
    pub filesize: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawRequestedDownload {
    pub filepath: Option<String>,
    #[serde(rename = "_filename")]
    pub filename: Option<String>,
}

impl RawInfo {
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Final path of the downloaded file.
    ///
    /// Prefers what the engine reports after post-processing, then the path it
    /// planned, then the single-file template rendered from the payload.
    pub fn file_path(&self, output_dir: &Path) -> PathBuf {
        let reported = self
            .requested_downloads
            .iter()
            .flatten()
            .find_map(|d| d.filepath.clone().or_else(|| d.filename.clone()))
            .or_else(|| self.filename.clone());

        match reported {
            Some(path) => PathBuf::from(path),
            None => output_dir.join(format!(
                "{}.{}",
                self.title.as_deref().unwrap_or("NA"),
                self.ext.as_deref().unwrap_or("NA")
            )),
        }
    }

    pub fn into_download_result(self, output_dir: &Path) -> DownloadResult {
        let file_path = self.file_path(output_dir);
        DownloadResult {
            title: self.title,
            duration_seconds: self.duration,
            uploader: self.uploader,
            file_path,
        }
    }

    pub fn into_video_info(self) -> VideoInfo {
        VideoInfo {
            title: self.title,
            duration_seconds: self.duration,
            uploader: self.uploader,
            description: self.description,
            view_count: self.view_count,
            thumbnail_url: self.thumbnail,
            formats: self
                .formats
                .unwrap_or_default()
                .into_iter()
                .map(|f| FormatDescriptor {
                    format_id: f.format_id,
                    extension: f.ext,
                    resolution: f.resolution,
                    filesize_bytes: f.filesize,
                })
                .collect(),
        }
    }

    /// Playlist entries in enumeration order; unavailable (null) entries are skipped
    pub fn into_playlist_entries(self) -> Vec<PlaylistEntryResult> {
        self.entries
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|entry| PlaylistEntryResult {
                title: entry.title,
                url: entry.webpage_url,
            })
            .collect()
    }
}

impl VideoInfo {
    /// Get the total size of all formats with a known size
    pub fn total_known_size(&self) -> u64 {
        self.formats.iter().filter_map(|f| f.filesize_bytes).sum()
    }
}
