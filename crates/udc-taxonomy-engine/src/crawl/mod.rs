//! Resumable crawl of the online classification tree.
//!
//! [`Crawler`] walks the pages a [`PageFetcher`] serves and collects raw
//! records for [`crate::hierarchy::build`]. [`CrawlState`] remembers which
//! nodes were already expanded and what they revealed, so an interrupted crawl
//! picks up again and still returns the whole record set.

use std::path::PathBuf;
use std::time::Duration;

pub mod driver;
pub mod state;

pub use driver::{CrawlOptions, Crawler, FetchError, PageFetcher, PageTarget, RetryPolicy};
pub use state::{CrawlState, Discovered, FlushPolicy};

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("failed to fetch {target} after {attempts} attempts: {source}")]
    Fetch {
        target: PageTarget,
        attempts: u32,
        #[source]
        source: FetchError,
    },
    #[error("crawl timed out after {0:?}")]
    TimedOut(Duration),
    #[error("failed to write crawl journal {path}: {source}")]
    Journal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
