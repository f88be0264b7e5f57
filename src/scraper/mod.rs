//! Feed scraping. Scroll a lazy-loaded feed in a headless browser and collect
//! the links it renders.

mod chromium;

pub use chromium::{ChromiumLauncher, ChromiumSession};

use crate::error::FetchError;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Feed scraped when none is given
pub const DEFAULT_FEED_URL: &str = "https://www.youtube.com/@Zdak/shorts";
/// Path fragment identifying short-form video links
pub const DEFAULT_PATH_FILTER: &str = "/shorts/";
pub const DEFAULT_SCROLL_ITERATIONS: u32 = 10;
pub const DEFAULT_SCROLL_PIXELS: i64 = 2000;
pub const DEFAULT_WAIT_PER_SCROLL: Duration = Duration::from_millis(1000);

/// Options for a scrape run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Page to load
    pub feed_url: String,
    /// How many scroll-and-wait cycles to run. Always run in full.
    pub scroll_iterations: u32,
    /// Vertical wheel distance per cycle
    pub scroll_pixels: i64,
    /// Pause after each scroll for content to load
    pub wait_per_scroll: Duration,
    /// Substring a link must contain to be kept
    pub path_filter: String,
    /// Upper bound for the initial navigation. `None` waits as long as it takes.
    pub navigation_timeout: Option<Duration>,
}

impl ScrapeOptions {
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            feed_url: feed_url.into(),
            ..Default::default()
        }
    }

    pub fn with_scroll_iterations(mut self, iterations: u32) -> Self {
        self.scroll_iterations = iterations;
        self
    }

    pub fn with_scroll_pixels(mut self, pixels: i64) -> Self {
        self.scroll_pixels = pixels;
        self
    }

    pub fn with_wait_per_scroll(mut self, wait: Duration) -> Self {
        self.wait_per_scroll = wait;
        self
    }

    pub fn with_path_filter(mut self, filter: impl Into<String>) -> Self {
        self.path_filter = filter.into();
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.navigation_timeout = timeout;
        self
    }
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            scroll_iterations: DEFAULT_SCROLL_ITERATIONS,
            scroll_pixels: DEFAULT_SCROLL_PIXELS,
            wait_per_scroll: DEFAULT_WAIT_PER_SCROLL,
            path_filter: DEFAULT_PATH_FILTER.to_string(),
            navigation_timeout: None,
        }
    }
}

/// Links found in one scrape run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FeedLinks {
    /// Unique matching links, sorted
    pub links: Vec<String>,
    /// Matching hrefs before deduplication
    pub total_matches: usize,
}

/// Keep hrefs containing `path_filter`, dedupe them and sort them
pub fn collect_links<I>(hrefs: I, path_filter: &str) -> FeedLinks
where
    I: IntoIterator<Item = String>,
{
    let mut total_matches = 0;
    let mut unique = BTreeSet::new();

    for href in hrefs {
        if href.contains(path_filter) {
            total_matches += 1;
            unique.insert(href);
        }
    }

    FeedLinks {
        links: unique.into_iter().collect(),
        total_matches,
    }
}

/// One browser with one open page
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate the page and wait for it to load
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// Dispatch a mouse-wheel event moving the viewport down by `pixels`
    async fn scroll_by(&mut self, pixels: i64) -> Result<()>;

    /// Resolved `href` of every anchor currently in the DOM
    async fn anchor_hrefs(&mut self) -> Result<Vec<String>>;

    /// Shut the browser down
    async fn close(&mut self) -> Result<()>;
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>>;
}

/// Drives a feed page through scroll cycles and extracts its links
pub struct FeedScraper<L: BrowserLauncher = ChromiumLauncher> {
    launcher: L,
}

impl FeedScraper<ChromiumLauncher> {
    /// Scraper using a headless Chromium found on this machine
    pub fn new() -> Self {
        Self::with_launcher(ChromiumLauncher::new())
    }
}

impl Default for FeedScraper<ChromiumLauncher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: BrowserLauncher> FeedScraper<L> {
    pub fn with_launcher(launcher: L) -> Self {
        Self { launcher }
    }

    /// Run one scrape.
    ///
    /// The browser is closed after the run whether it succeeded or not. Errors
    /// are not retried.
    pub async fn scrape(&self, options: &ScrapeOptions) -> Result<FeedLinks> {
        info!(
            "Scraping {} ({} scrolls of {}px)",
            options.feed_url, options.scroll_iterations, options.scroll_pixels
        );

        let mut session = self.launcher.launch().await?;
        let outcome = drive(session.as_mut(), options).await;
        let closed = session.close().await;

        let hrefs = match (outcome, closed) {
            (Ok(hrefs), Ok(())) => hrefs,
            (Ok(_), Err(e)) => return Err(e),
            (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(close_err)) => {
                warn!("Failed to close browser after error: {}", close_err);
                return Err(e);
            }
        };

        let links = collect_links(hrefs, &options.path_filter);
        info!(
            "Found {} matching links ({} unique)",
            links.total_matches,
            links.links.len()
        );
        Ok(links)
    }
}

async fn drive(session: &mut dyn BrowserSession, options: &ScrapeOptions) -> Result<Vec<String>> {
    match options.navigation_timeout {
        Some(limit) => tokio::time::timeout(limit, session.goto(&options.feed_url))
            .await
            .map_err(|_| FetchError::NavigationTimeout(limit))??,
        None => session.goto(&options.feed_url).await?,
    }

    for iteration in 1..=options.scroll_iterations {
        session.scroll_by(options.scroll_pixels).await?;
        tokio::time::sleep(options.wait_per_scroll).await;
        debug!("Scroll {}/{}", iteration, options.scroll_iterations);
    }

    let hrefs = session.anchor_hrefs().await?;
    debug!("Read {} anchors", hrefs.len());
    Ok(hrefs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Journal {
        launched: usize,
        visited: Vec<String>,
        scrolls: Vec<i64>,
        closed: usize,
    }

    /// Browser double: each scroll reveals the next batch of anchors
    #[derive(Clone, Default)]
    struct FakeLauncher {
        journal: Arc<Mutex<Journal>>,
        batches: Vec<Vec<&'static str>>,
        fail_on: Option<&'static str>,
        hang_navigation: bool,
    }

    struct FakeSession {
        journal: Arc<Mutex<Journal>>,
        batches: Vec<Vec<&'static str>>,
        fail_on: Option<&'static str>,
        hang_navigation: bool,
        revealed: usize,
    }

    impl FakeSession {
        fn check(&self, step: &'static str) -> Result<()> {
            if self.fail_on == Some(step) {
                return Err(FetchError::BrowserSetup(format!("{} exploded", step)));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BrowserLauncher for FakeLauncher {
        async fn launch(&self) -> Result<Box<dyn BrowserSession>> {
            self.journal.lock().unwrap().launched += 1;
            Ok(Box::new(FakeSession {
                journal: self.journal.clone(),
                batches: self.batches.clone(),
                fail_on: self.fail_on,
                hang_navigation: self.hang_navigation,
                revealed: 1,
            }))
        }
    }

    #[async_trait]
    impl BrowserSession for FakeSession {
        async fn goto(&mut self, url: &str) -> Result<()> {
            self.journal.lock().unwrap().visited.push(url.to_string());
            if self.hang_navigation {
                std::future::pending::<()>().await;
            }
            self.check("goto")
        }

        async fn scroll_by(&mut self, pixels: i64) -> Result<()> {
            self.check("scroll")?;
            self.journal.lock().unwrap().scrolls.push(pixels);
            self.revealed += 1;
            Ok(())
        }

        async fn anchor_hrefs(&mut self) -> Result<Vec<String>> {
            self.check("extract")?;
            Ok(self
                .batches
                .iter()
                .take(self.revealed)
                .flatten()
                .map(|s| s.to_string())
                .collect())
        }

        async fn close(&mut self) -> Result<()> {
            self.journal.lock().unwrap().closed += 1;
            self.check("close")
        }
    }

    fn quick(url: &str) -> ScrapeOptions {
        ScrapeOptions::new(url).with_wait_per_scroll(Duration::ZERO)
    }

    #[test]
    fn test_collect_links_filters_dedupes_sorts() {
        let hrefs = vec![
            "https://x/shorts/1".to_string(),
            "https://x/other".to_string(),
            "https://x/shorts/2".to_string(),
            "https://x/shorts/1".to_string(),
        ];

        let links = collect_links(hrefs, "/shorts/");
        assert_eq!(links.links, vec!["https://x/shorts/1", "https://x/shorts/2"]);
        assert_eq!(links.total_matches, 3);
    }

    #[test]
    fn test_collect_links_exact_match_dedupe() {
        let hrefs = vec![
            "https://x/shorts/b".to_string(),
            "https://x/shorts/a?feature=share".to_string(),
            "https://x/shorts/a".to_string(),
        ];

        let links = collect_links(hrefs, "/shorts/");
        assert_eq!(
            links.links,
            vec![
                "https://x/shorts/a",
                "https://x/shorts/a?feature=share",
                "https://x/shorts/b",
            ]
        );
    }

    #[test]
    fn test_collect_links_empty() {
        let links = collect_links(Vec::<String>::new(), "/shorts/");
        assert!(links.links.is_empty());
        assert_eq!(links.total_matches, 0);
    }

    #[test]
    fn test_scrape_options_defaults() {
        let options = ScrapeOptions::default();
        assert_eq!(options.feed_url, "https://www.youtube.com/@Zdak/shorts");
        assert_eq!(options.scroll_iterations, 10);
        assert_eq!(options.scroll_pixels, 2000);
        assert_eq!(options.wait_per_scroll, Duration::from_millis(1000));
        assert_eq!(options.path_filter, "/shorts/");
        assert_eq!(options.navigation_timeout, None);
    }

    #[tokio::test]
    async fn test_scrape_unions_all_scroll_states() {
        let launcher = FakeLauncher {
            batches: vec![
                vec!["https://x/shorts/1", "https://x/other"],
                vec!["https://x/shorts/2"],
                vec!["https://x/shorts/1", "https://x/@chan"],
                vec!["https://x/shorts/3"],
            ],
            ..Default::default()
        };
        let journal = launcher.journal.clone();
        let scraper = FeedScraper::with_launcher(launcher);

        let links = scraper
            .scrape(&quick("https://x/@chan/shorts").with_scroll_iterations(3))
            .await
            .unwrap();

        assert_eq!(
            links.links,
            vec!["https://x/shorts/1", "https://x/shorts/2", "https://x/shorts/3"]
        );
        assert_eq!(links.total_matches, 4);

        let journal = journal.lock().unwrap();
        assert_eq!(journal.launched, 1);
        assert_eq!(journal.visited, vec!["https://x/@chan/shorts"]);
        assert_eq!(journal.closed, 1);
    }

    #[tokio::test]
    async fn test_scrape_always_runs_every_iteration() {
        // Nothing new ever loads; all iterations still run
        let launcher = FakeLauncher {
            batches: vec![vec!["https://x/shorts/1"]],
            ..Default::default()
        };
        let journal = launcher.journal.clone();
        let scraper = FeedScraper::with_launcher(launcher);

        scraper
            .scrape(
                &quick("https://x")
                    .with_scroll_iterations(7)
                    .with_scroll_pixels(1500),
            )
            .await
            .unwrap();

        assert_eq!(journal.lock().unwrap().scrolls, vec![1500; 7]);
    }

    #[tokio::test]
    async fn test_scrape_custom_filter() {
        let launcher = FakeLauncher {
            batches: vec![vec!["https://x/watch?v=1", "https://x/shorts/2"]],
            ..Default::default()
        };
        let scraper = FeedScraper::with_launcher(launcher);

        let links = scraper
            .scrape(&quick("https://x").with_path_filter("/watch"))
            .await
            .unwrap();

        assert_eq!(links.links, vec!["https://x/watch?v=1"]);
    }

    #[tokio::test]
    async fn test_browser_closed_when_extraction_fails() {
        for step in ["goto", "scroll", "extract"] {
            let launcher = FakeLauncher {
                fail_on: Some(step),
                ..Default::default()
            };
            let journal = launcher.journal.clone();
            let scraper = FeedScraper::with_launcher(launcher);

            let err = scraper.scrape(&quick("https://x")).await.unwrap_err();

            assert_eq!(err.to_string(), format!("Browser setup failed: {} exploded", step));
            assert_eq!(journal.lock().unwrap().closed, 1, "step {}", step);
        }
    }

    #[tokio::test]
    async fn test_close_failure_surfaces_after_success() {
        let launcher = FakeLauncher {
            fail_on: Some("close"),
            ..Default::default()
        };
        let scraper = FeedScraper::with_launcher(launcher);

        let err = scraper.scrape(&quick("https://x")).await.unwrap_err();
        assert!(err.to_string().contains("close exploded"));
    }

    #[tokio::test]
    async fn test_navigation_timeout_is_opt_in() {
        let launcher = FakeLauncher {
            hang_navigation: true,
            ..Default::default()
        };
        let journal = launcher.journal.clone();
        let scraper = FeedScraper::with_launcher(launcher);

        let options = quick("https://x").with_navigation_timeout(Some(Duration::from_millis(20)));
        let err = scraper.scrape(&options).await.unwrap_err();

        assert!(matches!(err, FetchError::NavigationTimeout(_)));
        let journal = journal.lock().unwrap();
        assert!(journal.scrolls.is_empty());
        assert_eq!(journal.closed, 1);
    }
}
