//! Progress reporting for engine downloads

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

/// Marker prefixed to every progress line the engine emits for us
pub const PROGRESS_MARKER: &str = "[clipfetch-progress]";

/// Engine progress template producing `marker status|percent|speed|eta`
pub const PROGRESS_TEMPLATE: &str = "[clipfetch-progress] %(progress.status)s|%(progress._percent_str)s|%(progress._speed_str)s|%(progress._eta_str)s";

/// Placeholder for fields the engine could not compute
pub const NOT_AVAILABLE: &str = "N/A";

/// Download state reported by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Bytes are still arriving
    Downloading,
    /// One file finished downloading
    Finished,
    /// Any other state the engine reports (e.g., "error")
    Other(String),
}

impl ProgressStatus {
    fn parse(s: &str) -> Self {
        match s {
            "downloading" => ProgressStatus::Downloading,
            "finished" => ProgressStatus::Finished,
            other => ProgressStatus::Other(other.to_string()),
        }
    }
}

/// A single progress tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    /// Percentage as printed by the engine (e.g., "45.2%")
    pub percent: String,
    /// Speed as printed by the engine (e.g., "1.20MiB/s")
    pub speed: String,
    /// ETA as printed by the engine (e.g., "00:13")
    pub eta: String,
}

impl ProgressEvent {
    /// Parse a progress line. Returns `None` for anything that is not one.
    pub fn parse_line(line: &str) -> Option<Self> {
        let body = line.trim().strip_prefix(PROGRESS_MARKER)?;
        let mut fields = body.trim().splitn(4, '|');

        let status = fields.next()?.trim();
        if status.is_empty() {
            return None;
        }

        Some(Self {
            status: ProgressStatus::parse(status),
            percent: field_or_na(fields.next()),
            speed: field_or_na(fields.next()),
            eta: field_or_na(fields.next()),
        })
    }

    /// Percentage as a number, when the engine knew it
    pub fn percent_value(&self) -> Option<f64> {
        self.percent.trim_end_matches('%').trim().parse().ok()
    }
}

fn field_or_na(field: Option<&str>) -> String {
    let field = field.map(strip_ansi);
    match field.as_deref().map(str::trim) {
        // The engine renders missing template fields as "NA"
        None | Some("") | Some("NA") | Some("None") => NOT_AVAILABLE.to_string(),
        Some(value) => value.to_string(),
    }
}

/// Remove terminal color sequences the engine may embed in `_*_str` fields
fn strip_ansi(s: &str) -> String {
    static ANSI: OnceLock<Option<Regex>> = OnceLock::new();
    match ANSI.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").ok()) {
        Some(re) => re.replace_all(s, "").into_owned(),
        None => s.to_string(),
    }
}

/// Receives progress from a running download.
///
/// Called from the task that drains the engine output. Implementations must
/// not panic; there is no way to report an error back.
pub trait ProgressObserver: Send + Sync {
    /// Called on every progress tick while downloading
    fn on_progress(&self, event: &ProgressEvent);

    /// Called once per file when it finishes downloading
    fn on_finished(&self, event: &ProgressEvent);
}

/// Route an event to the matching observer method
pub fn dispatch(observer: &dyn ProgressObserver, event: &ProgressEvent) {
    match event.status {
        ProgressStatus::Downloading => observer.on_progress(event),
        ProgressStatus::Finished => observer.on_finished(event),
        ProgressStatus::Other(ref status) => {
            tracing::debug!("Ignoring progress status: {}", status);
        }
    }
}

/// Observer that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}

    fn on_finished(&self, _event: &ProgressEvent) {}
}

/// Terminal progress display backed by an indicatif bar
#[derive(Default)]
pub struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }
}

impl ProgressObserver for TerminalProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        let bar = guard.get_or_insert_with(|| {
            let bar = ProgressBar::new(100);
            bar.set_style(Self::style());
            bar
        });

        if let Some(percent) = event.percent_value() {
            bar.set_position(percent.clamp(0.0, 100.0) as u64);
        }
        bar.set_message(format!(
            "Downloading: {} at {} ETA: {}",
            event.percent, event.speed, event.eta
        ));
    }

    fn on_finished(&self, _event: &ProgressEvent) {
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };
        match guard.take() {
            Some(bar) => bar.finish_with_message("Download complete, processing..."),
            None => eprintln!("Download complete, processing..."),
        }
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exp = (bytes_f64.ln() / THRESHOLD.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    let value = bytes_f64 / THRESHOLD.powi(exp as i32);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.1} {}", value, UNITS[exp])
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    if total_seconds < 60 {
        format!("{}s", total_seconds)
    } else if total_seconds < 3600 {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        if seconds == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m {}s", minutes, seconds)
        }
    } else {
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, minutes)
        }
    }
}
