//! Page data recorded by a crawl
//!
//! A `PageRecord` is created once per canonical URL after a successful fetch. Only its
//! `reference_count` changes afterwards, as new in-edges are discovered.

use serde::Serialize;
use std::collections::HashMap;

/// One heading (`h1`..`h6`) in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    /// Heading level, 1 through 6
    pub level: u8,
    pub text: String,
    /// The element's `id` attribute, or empty
    pub id: String,
}

/// Document metadata from `<meta>` tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub description: String,
    pub keywords: String,
    pub author: String,
}

/// A followable link found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkInfo {
    /// Absolute URL of the link target
    pub href: String,
    pub text: String,
    #[serde(rename = "type")]
    pub link_type: String,
    pub title: String,
    /// Text of the nearest heading above the anchor, or empty
    pub parent: String,
    pub is_framework: bool,
    #[serde(rename = "isAPI")]
    pub is_api: bool,
}

/// Content extracted from a fetched page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContent {
    pub title: String,
    pub headings: Vec<Heading>,
    pub links: Vec<LinkInfo>,
    pub metadata: PageMetadata,
    /// Character count of the whitespace-collapsed body text
    pub content_length: usize,
}

/// A successfully crawled page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    /// Canonical URL
    pub url: String,
    /// Number of discovered in-edges, always >= 1
    pub reference_count: u32,
    pub content: PageContent,
    /// Canonical targets of every extracted link, in page order
    pub child_urls: Vec<String>,
}

/// A URL whose fetch failed after all retries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageError {
    pub url: String,
    pub error: String,
}

/// Canonical URL -> `PageRecord`, iterated in insertion order
#[derive(Debug, Clone, Default)]
pub struct PageMap {
    records: Vec<PageRecord>,
    index: HashMap<String, usize>,
}

impl PageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record unless its URL is already present
    ///
    /// Returns false (leaving the map untouched) for a duplicate URL.
    pub fn insert(&mut self, record: PageRecord) -> bool {
        if self.index.contains_key(&record.url) {
            return false;
        }
        self.index.insert(record.url.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, url: &str) -> Option<&PageRecord> {
        self.index.get(url).map(|&i| &self.records[i])
    }

    pub fn get_mut(&mut self, url: &str) -> Option<&mut PageRecord> {
        match self.index.get(url) {
            Some(&i) => self.records.get_mut(i),
            None => None,
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &PageRecord> {
        self.records.iter()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.url.as_str())
    }
}
