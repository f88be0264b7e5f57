//! Engine option structures and format selection

use std::fmt;

/// Format expression for the best video and best audio, muxed together
pub const BEST_VIDEO_AUDIO: &str = "bestvideo+bestaudio/best";
/// Format expression for the smallest available stream
pub const WORST: &str = "worst";
/// Format expression for the best audio-only stream
pub const BEST_AUDIO: &str = "bestaudio/best";

/// Codec used when extracting audio
pub const AUDIO_CODEC: &str = "mp3";
/// Target bitrate in kbps when extracting audio
pub const AUDIO_BITRATE_KBPS: u32 = 192;

/// Template appended to the output directory for single downloads
pub const SINGLE_TEMPLATE: &str = "%(title)s.%(ext)s";
/// Template appended to the output directory for playlist downloads
pub const PLAYLIST_TEMPLATE: &str = "%(playlist)s/%(title)s.%(ext)s";

/// Quality selection criteria
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QualitySelector {
    /// Best quality available
    #[default]
    Best,
    /// Worst quality available
    Worst,
    /// Best video at or below this height
    Height(u32),
    /// Unparsed height cap, handed to the engine as written
    Raw(String),
}

impl QualitySelector {
    /// Parse quality selector from string.
    ///
    /// `"720p"` and `"720"` both cap at 720 lines. Anything that is not numeric
    /// once trailing `p`s are removed becomes [`QualitySelector::Raw`].
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        if s.eq_ignore_ascii_case("best") {
            return QualitySelector::Best;
        }
        if s.eq_ignore_ascii_case("worst") {
            return QualitySelector::Worst;
        }

        let stripped = s.trim_end_matches(['p', 'P']);

        match stripped.parse::<u32>() {
            Ok(height) => QualitySelector::Height(height),
            Err(_) => QualitySelector::Raw(stripped.to_string()),
        }
    }

    /// Build the engine format expression for this quality
    pub fn format_expression(&self) -> String {
        match self {
            QualitySelector::Best => BEST_VIDEO_AUDIO.to_string(),
            QualitySelector::Worst => WORST.to_string(),
            QualitySelector::Height(height) => height_capped(&height.to_string()),
            QualitySelector::Raw(raw) => height_capped(raw),
        }
    }
}

impl fmt::Display for QualitySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualitySelector::Best => write!(f, "best"),
            QualitySelector::Worst => write!(f, "worst"),
            QualitySelector::Height(height) => write!(f, "{}p", height),
            QualitySelector::Raw(raw) => write!(f, "{}", raw),
        }
    }
}

impl From<&str> for QualitySelector {
    fn from(s: &str) -> Self {
        QualitySelector::parse(s)
    }
}

fn height_capped(height: &str) -> String {
    format!("bestvideo[height<={}]+bestaudio/best", height)
}

/// Post-download operation run by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessor {
    /// Transcode the downloaded stream to an audio file
    ExtractAudio {
        /// Target codec (e.g., "mp3")
        codec: String,
        /// Target bitrate in kbps
        bitrate_kbps: u32,
    },
}

impl PostProcessor {
    /// The fixed audio extraction used for audio-only downloads
    pub fn mp3_192() -> Self {
        PostProcessor::ExtractAudio {
            codec: AUDIO_CODEC.to_string(),
            bitrate_kbps: AUDIO_BITRATE_KBPS,
        }
    }

    fn push_args(&self, args: &mut Vec<String>) {
        match self {
            PostProcessor::ExtractAudio {
                codec,
                bitrate_kbps,
            } => {
                args.push("--extract-audio".to_string());
                args.push("--audio-format".to_string());
                args.push(codec.clone());
                args.push("--audio-quality".to_string());
                args.push(format!("{}K", bitrate_kbps));
            }
        }
    }
}

/// Engine configuration for a single invocation.
///
/// Every field is optional; unset fields leave the engine's own default in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Format expression (e.g., `bestvideo+bestaudio/best`)
    pub format: Option<String>,
    /// Output path template using `%(field)s` syntax
    pub output_template: Option<String>,
    /// Post-processing directives, applied in order
    pub postprocessors: Vec<PostProcessor>,
    /// Container for merged video+audio
    pub merge_output_format: Option<String>,
    /// Only resolve metadata, write nothing
    pub skip_download: bool,
    /// Suppress engine chatter
    pub quiet: bool,
    /// Suppress engine warnings
    pub no_warnings: bool,
    /// Emit machine-readable progress lines
    pub progress: bool,
}

impl EngineOptions {
    /// Options for a download written through the given output template
    pub fn download(output_template: impl Into<String>) -> Self {
        Self {
            output_template: Some(output_template.into()),
            ..Default::default()
        }
    }

    /// Options for a metadata-only lookup
    pub fn info_only() -> Self {
        Self {
            skip_download: true,
            quiet: true,
            ..Default::default()
        }
    }

    /// Choose format and post-processing for the requested quality.
    ///
    /// Audio-only requests ignore `quality` entirely.
    pub fn with_selection(mut self, quality: &QualitySelector, audio_only: bool) -> Self {
        if audio_only {
            self.format = Some(BEST_AUDIO.to_string());
            self.postprocessors = vec![PostProcessor::mp3_192()];
        } else {
            self.format = Some(quality.format_expression());
        }
        self
    }

    pub fn with_merge_output_format(mut self, container: Option<String>) -> Self {
        self.merge_output_format = container;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Translate into engine command-line arguments (without the URL)
    pub fn to_args(&self, progress_template: &str) -> Vec<String> {
        let mut args = vec!["--dump-single-json".to_string()];

        if self.skip_download {
            args.push("--skip-download".to_string());
        } else {
            args.push("--no-simulate".to_string());
        }

        if let Some(format) = &self.format {
            args.push("-f".to_string());
            args.push(format.clone());
        }

        if let Some(template) = &self.output_template {
            args.push("-o".to_string());
            args.push(template.clone());
        }

        for processor in &self.postprocessors {
            processor.push_args(&mut args);
        }

        if let Some(container) = &self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(container.clone());
        }

        if self.quiet {
            args.push("--quiet".to_string());
        }
        if self.no_warnings {
            args.push("--no-warnings".to_string());
        }

        // -J implies quiet, which hides progress unless asked for explicitly
        if self.progress {
            args.push("--progress".to_string());
            args.push("--newline".to_string());
            args.push("--progress-template".to_string());
            args.push(format!("download:{}", progress_template));
        } else {
            args.push("--no-progress".to_string());
        }

        args
    }
}
