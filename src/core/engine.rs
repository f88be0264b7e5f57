//! Extraction engine seam and the yt-dlp process implementation

use crate::core::options::EngineOptions;
use crate::core::progress::{dispatch, ProgressEvent, ProgressObserver, PROGRESS_TEMPLATE};
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

/// Number of trailing stderr lines kept for error messages
const STDERR_TAIL: usize = 5;

/// Something that resolves a URL into media and metadata.
///
/// Returns the engine's info payload for the URL. With
/// [`EngineOptions::skip_download`] unset it also writes the media files.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn run(
        &self,
        url: &str,
        options: &EngineOptions,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> anyhow::Result<serde_json::Value>;
}

/// yt-dlp invoked as a child process
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: String,
    base_args: Vec<String>,
}

impl YtDlp {
    /// Use `yt-dlp` from `PATH`
    pub fn new() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            base_args: Vec::new(),
        }
    }

    /// Use a custom command, e.g. `python3` with `["-m", "yt_dlp"]`
    pub fn with_command(program: impl Into<String>, base_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            base_args,
        }
    }

    /// Parse a whitespace-separated command line such as `python3 -m yt_dlp`
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::with_command(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn build_args(&self, url: &str, options: &EngineOptions) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend(options.to_args(PROGRESS_TEMPLATE));
        // Keep URLs that start with '-' from being read as options
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Engine for YtDlp {
    async fn run(
        &self,
        url: &str,
        options: &EngineOptions,
        observer: Option<Arc<dyn ProgressObserver>>,
    ) -> anyhow::Result<serde_json::Value> {
        let args = self.build_args(url, options);
        debug!("Running {} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("PYTHONIOENCODING", "utf-8")
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start {}", self.program))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("{} stdout was not captured", self.program))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("{} stderr was not captured", self.program))?;

        // Drain both pipes together so a full pipe never stalls the child.
        // Progress may arrive on either stream depending on the yt-dlp build.
        let read_stdout = drain_stdout(stdout, observer.clone());
        let read_stderr = drain_stderr(stderr, observer);

        let (payload, stderr_report) = tokio::join!(read_stdout, read_stderr);
        let payload = payload.context("failed to read engine output")?;
        let stderr_report = stderr_report.context("failed to read engine diagnostics")?;

        let status = child
            .wait()
            .await
            .with_context(|| format!("failed to wait for {}", self.program))?;

        if !status.success() {
            let cause = stderr_report
                .failure_message()
                .unwrap_or_else(|| format!("{} exited with {}", self.program, status));
            bail!(cause);
        }

        let json_line = payload.ok_or_else(|| anyhow!("{} produced no metadata", self.program))?;
        serde_json::from_str(&json_line).context("engine returned malformed metadata")
    }
}

/// Read one line, replacing invalid UTF-8 instead of failing
async fn next_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Forward a progress line to the observer. Returns false for other lines.
fn forward_progress(line: &str, observer: &Option<Arc<dyn ProgressObserver>>) -> bool {
    match ProgressEvent::parse_line(line) {
        Some(event) => {
            if let Some(observer) = observer {
                dispatch(observer.as_ref(), &event);
            }
            true
        }
        None => false,
    }
}

/// Drain stdout, returning its last non-progress, non-empty line: the info payload
async fn drain_stdout(
    stdout: tokio::process::ChildStdout,
    observer: Option<Arc<dyn ProgressObserver>>,
) -> std::io::Result<Option<String>> {
    let mut reader = BufReader::new(stdout);
    let mut buf = Vec::new();
    let mut payload = None;

    while let Some(line) = next_lossy_line(&mut reader, &mut buf).await? {
        if forward_progress(&line, &observer) {
            continue;
        }
        let line = line.trim();
        if !line.is_empty() {
            payload = Some(line.to_string());
        }
    }

    Ok(payload)
}

#[derive(Debug, Default)]
struct StderrReport {
    errors: Vec<String>,
    tail: Vec<String>,
}

impl StderrReport {
    fn failure_message(&self) -> Option<String> {
        if !self.errors.is_empty() {
            Some(self.errors.join("; "))
        } else if !self.tail.is_empty() {
            Some(self.tail.join("; "))
        } else {
            None
        }
    }
}

async fn drain_stderr(
    stderr: tokio::process::ChildStderr,
    observer: Option<Arc<dyn ProgressObserver>>,
) -> std::io::Result<StderrReport> {
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    let mut report = StderrReport::default();

    while let Some(line) = next_lossy_line(&mut reader, &mut buf).await? {
        if forward_progress(&line, &observer) {
            continue;
        }

        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        debug!("yt-dlp: {}", line);

        if line.starts_with("ERROR:") {
            report.errors.push(line.clone());
        }
        report.tail.push(line);
        if report.tail.len() > STDERR_TAIL {
            report.tail.remove(0);
        }
    }

    Ok(report)
}
