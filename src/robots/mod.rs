//! Robots policy hook
//!
//! The crawl engine asks a `RobotsPolicy` before fetching each URL. Only the
//! permissive `AllowAll` policy ships with this crate; a real robots.txt implementation
//! can be injected through `CrawlEngine::with_robots`.

/// Decides whether a URL may be fetched
pub trait RobotsPolicy: Send + Sync {
    /// Checks if a URL is allowed
    ///
    /// # Arguments
    ///
    /// * `url` - The canonical URL about to be fetched
    ///
    /// # Returns
    ///
    /// * `true` - If the URL may be fetched
    /// * `false` - If the URL must be skipped
    fn is_allowed(&self, url: &str) -> bool;
}

/// Policy that allows every URL
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RobotsPolicy for AllowAll {
    fn is_allowed(&self, _url: &str) -> bool {
        true
    }
}
