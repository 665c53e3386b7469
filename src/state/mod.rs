//! State module for tracking crawl progress
//!
//! This module provides the data recorded during a crawl and the shared structures that
//! concurrent traversal branches coordinate through.
//!
//! # Components
//!
//! - `PageRecord` / `PageContent` / `LinkInfo`: what a successful fetch produces
//! - `VisitedSet`: atomic claim set that makes every URL fetched at most once
//! - `CrawlLedger`: pages, in-edge tallies and errors while a crawl is in flight
//! - `CrawlState`: the finished result of one crawl invocation

mod crawl_state;
mod page;
mod visited;

// Re-export main types
pub use crawl_state::{CrawlLedger, CrawlState};
pub use page::{Heading, LinkInfo, PageContent, PageError, PageMap, PageMetadata, PageRecord};
pub use visited::VisitedSet;
