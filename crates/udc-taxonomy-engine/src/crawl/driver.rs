use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::{CrawlError, CrawlState, Discovered};
use crate::models::RawRecord;
use crate::parsing::parse_records;

/// A page the crawl can ask for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageTarget {
    /// The classification's landing page.
    Root,
    /// The page with the node carrying this external id expanded.
    Node(String),
}

impl fmt::Display for PageTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageTarget::Root => write!(f, "root page"),
            PageTarget::Node(id) => write!(f, "node {id}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
}

/// Source of classification pages. Implementations do one request per call;
/// retries and pacing belong to the [`Crawler`].
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, target: &PageTarget) -> Result<String, FetchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Delay after failed attempt `n` is `n × step`.
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            step: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOptions {
    pub max_depth: usize,
    pub retry: RetryPolicy,
    pub polite_delay_min: Duration,
    pub polite_delay_max: Duration,
    pub timeout: Duration,
    pub verbose: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: 10,
            retry: RetryPolicy::default(),
            polite_delay_min: Duration::from_millis(500),
            polite_delay_max: Duration::from_millis(1300),
            timeout: Duration::from_secs(30 * 60),
            verbose: false,
        }
    }
}

/// A discovered node waiting to be expanded.
struct Pending {
    id: String,
    code: String,
    depth: usize,
}

/// Sequential depth-first crawl over the classification pages.
///
/// Every record is collected once. Each node whose code the [`CrawlState`]
/// has not marked visited is expanded by fetching its page, which may reveal
/// further records. A node is marked only after its page was read, and
/// records kept by earlier runs are returned again, so a resumed crawl yields
/// the same set as an uninterrupted one.
pub struct Crawler<F> {
    fetcher: F,
    state: CrawlState,
    options: CrawlOptions,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(fetcher: F, state: CrawlState, options: CrawlOptions) -> Self {
        Self {
            fetcher,
            state,
            options,
        }
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Runs the crawl to completion, failure, or timeout. The journal gets a
    /// forced flush on every exit path.
    pub async fn run(&self) -> Result<Vec<RawRecord>, CrawlError> {
        let mut records = Vec::new();

        let outcome = match tokio::time::timeout(self.options.timeout, self.crawl(&mut records))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(CrawlError::TimedOut(self.options.timeout)),
        };
        let flushed = self.state.final_flush();

        match (outcome, flushed) {
            (Ok(()), Ok(())) => {
                log::info!(
                    "Crawl finished: {} records, {} nodes visited",
                    records.len(),
                    self.state.len()
                );
                Ok(records)
            }
            (Ok(()), Err(flush_err)) => Err(flush_err),
            (Err(err), flushed) => {
                if let Err(flush_err) = flushed {
                    log::error!("Final flush failed after crawl error: {flush_err}");
                }
                Err(err)
            }
        }
    }

    async fn crawl(&self, records: &mut Vec<RawRecord>) -> Result<(), CrawlError> {
        let mut seen = HashSet::new();
        let mut stack = Vec::new();

        let resumed = self.state.discovered();
        if !resumed.is_empty() {
            log::info!("Resuming with {} records from earlier runs", resumed.len());
        }
        let mut unexpanded = Vec::new();
        for Discovered { record, depth } in resumed {
            if !seen.insert(record.code.clone()) {
                continue;
            }
            if !self.state.is_visited(&record.code) {
                unexpanded.push(Pending {
                    id: record.external_id.clone(),
                    code: record.code.clone(),
                    depth,
                });
            }
            records.push(record);
        }
        stack.extend(unexpanded.into_iter().rev());

        let html = self.fetch_with_retry(&PageTarget::Root).await?;
        self.discover(&html, 0, &mut seen, records, &mut stack);

        while let Some(next) = stack.pop() {
            if next.depth > self.options.max_depth {
                log::warn!("Max depth reached at {}", next.code);
                continue;
            }
            if self.state.is_visited(&next.code) {
                continue;
            }

            if self.options.verbose {
                log::info!("Expanding {} (id {})", next.code, next.id);
            }
            tokio::time::sleep(self.polite_delay()).await;

            let html = self.fetch_with_retry(&PageTarget::Node(next.id)).await?;
            self.discover(&html, next.depth, &mut seen, records, &mut stack);
            self.state.mark_visited(&next.code);
        }
        Ok(())
    }

    /// Collects records not seen before, hands them to the journal and queues
    /// them for expansion so the first one on the page is expanded first.
    fn discover(
        &self,
        html: &str,
        depth: usize,
        seen: &mut HashSet<String>,
        records: &mut Vec<RawRecord>,
        stack: &mut Vec<Pending>,
    ) {
        let mut fresh = Vec::new();
        for record in parse_records(html, self.options.verbose) {
            if !seen.insert(record.code.clone()) {
                continue;
            }
            fresh.push(Pending {
                id: record.external_id.clone(),
                code: record.code.clone(),
                depth: depth + 1,
            });
            self.state.remember(record.clone(), depth + 1);
            records.push(record);
        }
        stack.extend(fresh.into_iter().rev());
    }

    async fn fetch_with_retry(&self, target: &PageTarget) -> Result<String, CrawlError> {
        let attempts = self.options.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetcher.fetch(target).await {
                Ok(html) => return Ok(html),
                Err(source) if attempt >= attempts => {
                    return Err(CrawlError::Fetch {
                        target: target.clone(),
                        attempts,
                        source,
                    });
                }
                Err(err) => {
                    log::warn!("Retry {attempt}/{attempts} for {target} after error: {err}");
                    tokio::time::sleep(self.options.retry.step * attempt).await;
                    attempt += 1;
                }
            }
        }
    }

    fn polite_delay(&self) -> Duration {
        let min = self.options.polite_delay_min;
        let max = self.options.polite_delay_max;
        if max <= min {
            return min;
        }
        let millis = rand::rng().random_range(min.as_millis()..=max.as_millis());
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}
