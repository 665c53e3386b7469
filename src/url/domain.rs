use url::Url;

/// Extracts the lowercase hostname from a URL
///
/// Ports are ignored: `example.com:8080` and `example.com` share a hostname.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docs_mapper::url::extract_host;
///
/// let url = Url::parse("https://Docs.Example.com/path").unwrap();
/// assert_eq!(extract_host(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if `candidate` parses and its hostname equals `origin`
///
/// Unparseable candidates are never same-origin.
pub fn is_same_origin(origin: &str, candidate: &str) -> bool {
    Url::parse(candidate)
        .ok()
        .and_then(|url| extract_host(&url))
        .is_some_and(|host| host == origin)
}
