//! Media fetcher: option building, engine invocation and result reshaping

use crate::core::engine::{Engine, YtDlp};
use crate::core::options::{EngineOptions, QualitySelector, PLAYLIST_TEMPLATE, SINGLE_TEMPLATE};
use crate::core::progress::{ProgressObserver, TerminalProgress};
use crate::core::video_info::{DownloadResult, PlaylistEntryResult, RawInfo, VideoInfo};
use crate::error::{EngineOp, FetchError};
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Default output directory for library use
pub const DEFAULT_OUTPUT_DIR: &str = "downloads";

/// A single download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Video or playlist URL
    pub url: String,
    /// Quality selector
    pub quality: QualitySelector,
    /// Download audio only, transcoded to mp3
    pub audio_only: bool,
    /// Report progress to the fetcher's observer
    pub show_progress: bool,
    /// Force the container of merged video+audio
    pub merge_output_format: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            quality: QualitySelector::Best,
            audio_only: false,
            show_progress: true,
            merge_output_format: None,
        }
    }

    /// Set quality, e.g. `"best"`, `"worst"` or `"720p"`
    pub fn with_quality(mut self, quality: impl Into<QualitySelector>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }

    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Merge separate video and audio streams into this container
    pub fn merge_into(mut self, container: impl Into<String>) -> Self {
        self.merge_output_format = Some(container.into());
        self
    }
}

/// Downloads media through an extraction engine into one output directory
pub struct MediaFetcher<E: Engine = YtDlp> {
    output_dir: PathBuf,
    engine: E,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl MediaFetcher<YtDlp> {
    /// Create a fetcher using `yt-dlp` from `PATH`.
    ///
    /// Creates `output_dir` if it does not exist yet.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_engine(output_dir, YtDlp::new())
    }
}

impl<E: Engine> MediaFetcher<E> {
    /// Create a fetcher with a specific engine
    pub fn with_engine(output_dir: impl Into<PathBuf>, engine: E) -> Result<Self> {
        let fetcher = Self {
            output_dir: output_dir.into(),
            engine,
            observer: Some(Arc::new(TerminalProgress::new())),
        };
        fetcher.ensure_output_dir()?;
        Ok(fetcher)
    }

    /// Replace the progress observer
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Never report progress, whatever the request says
    pub fn without_observer(mut self) -> Self {
        self.observer = None;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Download a single video (or its audio)
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadResult> {
        let url = validate_url(&request.url)?;
        self.ensure_output_dir()?;

        let options = self.download_options(request, SINGLE_TEMPLATE);
        info!("Downloading {} ({})", url, describe(request));

        let payload = self
            .engine
            .run(url, &options, self.observer_for(request))
            .await
            .map_err(|e| FetchError::engine(EngineOp::Download, e))?;

        let raw = RawInfo::from_value(payload)
            .map_err(|e| FetchError::engine(EngineOp::Download, e.into()))?;
        let result = raw.into_download_result(&self.output_dir);
        info!("Saved {}", result.file_path.display());
        Ok(result)
    }

    /// Look up metadata without downloading anything
    pub async fn get_info(&self, url: &str) -> Result<VideoInfo> {
        let url = validate_url(url)?;
        info!("Fetching info for {}", url);

        let payload = self
            .engine
            .run(url, &EngineOptions::info_only(), None)
            .await
            .map_err(|e| FetchError::engine(EngineOp::Info, e))?;

        let raw = RawInfo::from_value(payload)
            .map_err(|e| FetchError::engine(EngineOp::Info, e.into()))?;
        Ok(raw.into_video_info())
    }

    /// Download every entry of a playlist into `<output_dir>/<playlist>/`.
    ///
    /// Returns title and page URL per entry only. Fails as a whole if the engine
    /// fails; entries downloaded before the failure are not reported.
    pub async fn download_playlist(
        &self,
        request: &DownloadRequest,
    ) -> Result<Vec<PlaylistEntryResult>> {
        let url = validate_url(&request.url)?;
        self.ensure_output_dir()?;

        let options = self.download_options(request, PLAYLIST_TEMPLATE);
        info!("Downloading playlist {} ({})", url, describe(request));

        let payload = self
            .engine
            .run(url, &options, self.observer_for(request))
            .await
            .map_err(|e| FetchError::engine(EngineOp::Playlist, e))?;

        let raw = RawInfo::from_value(payload)
            .map_err(|e| FetchError::engine(EngineOp::Playlist, e.into()))?;
        let entries = raw.into_playlist_entries();
        info!("Playlist finished: {} entries", entries.len());
        Ok(entries)
    }

    fn download_options(&self, request: &DownloadRequest, template: &str) -> EngineOptions {
        let template = self.output_dir.join(template);
        EngineOptions::download(template.to_string_lossy())
            .with_selection(&request.quality, request.audio_only)
            .with_merge_output_format(request.merge_output_format.clone())
            .with_progress(request.show_progress && self.observer.is_some())
    }

    fn observer_for(&self, request: &DownloadRequest) -> Option<Arc<dyn ProgressObserver>> {
        if request.show_progress {
            self.observer.clone()
        } else {
            None
        }
    }

    fn ensure_output_dir(&self) -> Result<()> {
        if !self.output_dir.is_dir() {
            debug!("Creating output directory {}", self.output_dir.display());
        }
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}

fn validate_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(FetchError::InvalidUrl("URL must not be empty".to_string()));
    }
    Ok(url)
}

fn describe(request: &DownloadRequest) -> String {
    if request.audio_only {
        "audio only".to_string()
    } else {
        format!("quality {}", request.quality)
    }
}
