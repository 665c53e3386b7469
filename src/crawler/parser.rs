//! HTML extraction for documentation pages
//!
//! This module turns raw markup into:
//! - Followable links with their surrounding context (`extract_links`)
//! - Title, headings, meta tags and body text size (`build_page_content`)

use crate::state::{Heading, LinkInfo, PageContent, PageMetadata};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const HEADING_SELECTOR: &str = "h1, h2, h3, h4, h5, h6";

/// Builds the page content record from fetched markup and its extracted links
///
/// # Example
///
/// ```
/// use docs_mapper::crawler::build_page_content;
///
/// let html = r#"<html><head><title>Guide</title></head><body><h1 id="top">Intro</h1></body></html>"#;
/// let content = build_page_content(html, Vec::new());
/// assert_eq!(content.title, "Guide");
/// assert_eq!(content.headings[0].id, "top");
/// ```
pub fn build_page_content(html: &str, links: Vec<LinkInfo>) -> PageContent {
    let document = Html::parse_document(html);

    PageContent {
        title: extract_title(&document),
        headings: extract_headings(&document),
        links,
        metadata: extract_metadata(&document),
        content_length: body_text_length(&document),
    }
}

/// Extracts followable links from an HTML document
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` tags with visible text whose absolute URL contains one
/// of `patterns` (every link when `patterns` is empty).
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links and data URIs
/// - Links carrying a `#` fragment
/// - `<a href="..." download>`
/// - Non-HTTP(S) URLs after resolution
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the document was served from, for resolving relative links
/// * `patterns` - Substrings a link URL must contain to be kept
pub fn extract_links(html: &str, base_url: &Url, patterns: &[String]) -> Vec<LinkInfo> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let (Ok(a_selector), Ok(heading_selector)) =
        (Selector::parse("a[href]"), Selector::parse(HEADING_SELECTOR))
    else {
        return links;
    };

    for element in document.select(&a_selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        else {
            continue;
        };

        if href.contains('#') {
            continue;
        }

        if !patterns.is_empty() && !patterns.iter().any(|p| href.contains(p.as_str())) {
            continue;
        }

        let text = collapse_whitespace(&element.text().collect::<String>());
        if text.is_empty() {
            continue;
        }

        let title = element
            .value()
            .attr("title")
            .or_else(|| element.value().attr("aria-label"))
            .map(collapse_whitespace)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text.clone());

        let is_framework = href.contains("/documentation/") || href.contains("/library/");
        let is_api = href.contains("/api/");
        let link_type = if is_framework || is_api {
            "documentation"
        } else {
            "page"
        };

        links.push(LinkInfo {
            parent: parent_heading(element, &heading_selector),
            href,
            text,
            link_type: link_type.to_string(),
            title,
            is_framework,
            is_api,
        });
    }

    links
}

/// Text of the first heading found while walking up from the anchor, or empty
fn parent_heading(anchor: ElementRef<'_>, heading_selector: &Selector) -> String {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find_map(|ancestor| ancestor.select(heading_selector).next())
        .map(|heading| collapse_whitespace(&heading.text().collect::<String>()))
        .unwrap_or_default()
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .unwrap_or_default()
}

/// Extracts every heading in document order
fn extract_headings(document: &Html) -> Vec<Heading> {
    let Ok(selector) = Selector::parse(HEADING_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let level = element.value().name().strip_prefix('h')?.parse::<u8>().ok()?;
            Some(Heading {
                level,
                text: collapse_whitespace(&element.text().collect::<String>()),
                id: element.value().id().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Extracts description, keywords and author meta tags
fn extract_metadata(document: &Html) -> PageMetadata {
    let description = meta_content(document, r#"meta[name="description"]"#)
        .filter(|d| !d.is_empty())
        .or_else(|| meta_content(document, r#"meta[property="og:description"]"#))
        .unwrap_or_default();

    PageMetadata {
        description,
        keywords: meta_content(document, r#"meta[name="keywords"]"#).unwrap_or_default(),
        author: meta_content(document, r#"meta[name="author"]"#).unwrap_or_default(),
    }
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
}

/// Character count of the visible body text, whitespace collapsed
fn body_text_length(document: &Html) -> usize {
    let Ok(body_selector) = Selector::parse("body") else {
        return 0;
    };
    let Some(body) = document.select(&body_selector).next() else {
        return 0;
    };

    let mut text = String::new();
    for node in body.descendants() {
        let Node::Text(fragment) = node.value() else {
            continue;
        };

        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|e| e.name()))
            .is_some_and(|name| matches!(name, "script" | "style" | "noscript" | "template"));
        if !hidden {
            text.push(' ');
            text.push_str(fragment);
        }
    }

    collapse_whitespace(&text).chars().count()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only (same page) anchors
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
