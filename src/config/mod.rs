//! Configuration module for Docs-Mapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing values fall back to the crawler defaults.
//!
//! # Example
//!
//! ```no_run
//! use docs_mapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("docs-mapper.toml")).unwrap();
//! println!("Crawler will keep at most {} fetches open", config.crawler.max_concurrent);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, FetcherConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate_seed_url;
