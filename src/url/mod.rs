//! URL handling module for Docs-Mapper
//!
//! This module provides URL canonicalization, host extraction and the same-origin
//! check that scopes a crawl to the seed's hostname.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_host, is_same_origin};
pub use normalize::canonicalize_url;
