use crate::state::page::{PageError, PageMap, PageRecord};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// The outcome of one crawl invocation
///
/// Owned by a single run and never shared between runs, so a second crawl of the same
/// site starts from an empty visited set.
#[derive(Debug, Clone)]
pub struct CrawlState {
    /// Canonical seed URL
    pub seed: String,
    /// Hostname every crawled page shares with the seed
    pub origin: String,
    pub pages: PageMap,
    /// Every URL a branch claimed for fetching, successful or not
    pub visited: HashSet<String>,
    pub errors: Vec<PageError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlState {
    /// Creates an empty state, stamped as started and finished now
    pub fn new(seed: impl Into<String>, origin: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            seed: seed.into(),
            origin: origin.into(),
            pages: PageMap::new(),
            visited: HashSet::new(),
            errors: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }
}

/// Mutable bookkeeping shared by the branches of a crawl in flight
///
/// Reference tallies live here rather than only on records because an in-edge can be
/// discovered while its target is still being fetched and has no record yet.
#[derive(Debug, Default)]
pub struct CrawlLedger {
    pages: PageMap,
    references: HashMap<String, u32>,
    errors: Vec<PageError>,
}

impl CrawlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one discovered in-edge to `url` and returns the new tally
    pub fn record_discovery(&mut self, url: &str) -> u32 {
        let count = self.references.entry(url.to_string()).or_insert(0);
        *count += 1;
        let count = *count;

        if let Some(record) = self.pages.get_mut(url) {
            record.reference_count = count;
        }

        count
    }

    /// Inserts a freshly fetched page, carrying over in-edges tallied so far
    ///
    /// Returns false if the URL already has a record.
    pub fn insert_page(&mut self, mut record: PageRecord) -> bool {
        record.reference_count = self.references.get(&record.url).copied().unwrap_or(1).max(1);
        self.pages.insert(record)
    }

    pub fn record_error(&mut self, url: impl Into<String>, error: impl Into<String>) {
        self.errors.push(PageError {
            url: url.into(),
            error: error.into(),
        });
    }

    pub fn contains_page(&self, url: &str) -> bool {
        self.pages.contains(url)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Splits the ledger into its final page map and error list
    pub fn into_parts(self) -> (PageMap, Vec<PageError>) {
        (self.pages, self.errors)
    }
}
