//! Journal for resumable crawls: the codes already expanded plus every record
//! found so far.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::CrawlError;
use crate::models::RawRecord;

/// When an unforced flush happens: after `max_pending` marks or once
/// `max_interval` has passed since the previous flush, whichever comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    pub max_pending: usize,
    pub max_interval: Duration,
}

impl Default for FlushPolicy {
    fn default() -> Self {
        Self {
            max_pending: 25,
            max_interval: Duration::from_secs(60),
        }
    }
}

/// A record found during a crawl and the depth it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovered {
    #[serde(flatten)]
    pub record: RawRecord,
    pub depth: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Journal {
    visited: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    discovered: Vec<Discovered>,
}

#[derive(Debug)]
struct Inner {
    visited: BTreeSet<String>,
    discovered: Vec<Discovered>,
    pending: usize,
    last_flush: Instant,
}

#[derive(Debug)]
pub struct CrawlState {
    path: PathBuf,
    policy: FlushPolicy,
    inner: Mutex<Inner>,
    flushes: AtomicUsize,
}

impl CrawlState {
    /// Resumes from `journal_path` with the default policy.
    pub fn load(journal_path: impl Into<PathBuf>) -> Self {
        Self::with_policy(journal_path, FlushPolicy::default())
    }

    /// Resumes from `journal_path`. A missing or unreadable journal starts
    /// an empty state instead of failing.
    pub fn with_policy(journal_path: impl Into<PathBuf>, policy: FlushPolicy) -> Self {
        let path = journal_path.into();
        let journal = read_journal(&path);

        Self {
            path,
            policy,
            inner: Mutex::new(Inner {
                visited: journal.visited.into_iter().collect(),
                discovered: journal.discovered,
                pending: 0,
                last_flush: Instant::now(),
            }),
            flushes: AtomicUsize::new(0),
        }
    }

    pub fn journal_path(&self) -> &Path {
        &self.path
    }

    /// Records `code` as visited. Returns true when this call flushed the
    /// journal.
    pub fn mark_visited(&self, code: &str) -> bool {
        let due = {
            let mut inner = self.inner.lock();
            inner.visited.insert(code.to_string());
            inner.pending += 1;
            let due = inner.pending >= self.policy.max_pending
                || inner.last_flush.elapsed() >= self.policy.max_interval;
            if due {
                inner.pending = 0;
                inner.last_flush = Instant::now();
            }
            due
        };

        if due && let Err(err) = self.write_journal() {
            // Keep crawling on the in-memory set; the next flush retries.
            log::warn!("State flush failed: {err}");
        }
        due
    }

    /// Keeps a found record for the next flush. The driver calls this before
    /// marking the page it came from as visited, so every visited page's
    /// records are in the journal too.
    pub fn remember(&self, record: RawRecord, depth: usize) {
        self.inner
            .lock()
            .discovered
            .push(Discovered { record, depth });
    }

    /// Records found by this and earlier runs, in the order they were found.
    pub fn discovered(&self) -> Vec<Discovered> {
        self.inner.lock().discovered.clone()
    }

    pub fn is_visited(&self, code: &str) -> bool {
        self.inner.lock().visited.contains(code)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().visited.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().visited.is_empty()
    }

    /// Number of journal writes that succeeded so far.
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Writes the journal regardless of the policy counters.
    pub fn final_flush(&self) -> Result<(), CrawlError> {
        {
            let mut inner = self.inner.lock();
            inner.pending = 0;
            inner.last_flush = Instant::now();
        }
        self.write_journal()
    }

    fn write_journal(&self) -> Result<(), CrawlError> {
        let journal = {
            let inner = self.inner.lock();
            Journal {
                visited: inner.visited.iter().cloned().collect(),
                discovered: inner.discovered.clone(),
            }
        };
        let total = journal.visited.len();
        let records = journal.discovered.len();

        let tmp_path = self.path.with_extension("json.tmp");
        let written = serde_json::to_string_pretty(&journal)
            .map_err(std::io::Error::from)
            .and_then(|json| {
                if let Some(parent) = self.path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&tmp_path, json)?;
                fs::rename(&tmp_path, &self.path)
            });

        match written {
            Ok(()) => {
                self.flushes.fetch_add(1, Ordering::Relaxed);
                log::info!("State flushed to disk ({total} nodes, {records} records)");
                Ok(())
            }
            Err(source) => Err(CrawlError::Journal {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

fn read_journal(path: &Path) -> Journal {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            log::info!("No crawl journal at {}, starting fresh", path.display());
            return Journal::default();
        }
    };

    match serde_json::from_str::<Journal>(&content) {
        Ok(journal) => {
            log::info!(
                "Loaded {} previously visited nodes and {} records from {}",
                journal.visited.len(),
                journal.discovered.len(),
                path.display()
            );
            journal
        }
        Err(err) => {
            log::warn!("Ignoring unreadable crawl journal {}: {err}", path.display());
            Journal::default()
        }
    }
}
