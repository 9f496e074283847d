//! HTML parsing contract and production implementation
//!
//! The crawl engine only needs a title and the raw `href` values of a page;
//! everything else (resolution, scheme and host filtering) happens in the
//! engine against the URL classifier. Parsing is best-effort and never fails
//! on malformed markup.

use scraper::{Html, Selector};

/// Title used when a page has no non-empty `<title>` element
pub const DEFAULT_TITLE: &str = "No title";

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// The page title, or [`DEFAULT_TITLE`] if none was found
    pub title: String,

    /// Raw, unfiltered href values of `<a href>` elements, in document order
    pub links: Vec<String>,
}

/// Contract for turning raw HTML into a title and outbound href list
pub trait PageParser: Send + Sync {
    fn parse_html(&self, raw_html: &str) -> ParsedPage;
}

/// Production parser backed by `scraper`
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlPageParser;

impl PageParser for HtmlPageParser {
    fn parse_html(&self, raw_html: &str) -> ParsedPage {
        let document = Html::parse_document(raw_html);

        ParsedPage {
            title: extract_title(&document),
            links: extract_hrefs(&document),
        }
    }
}

fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse("title") else {
        return DEFAULT_TITLE.to_string();
    };

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

fn extract_hrefs(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> ParsedPage {
        HtmlPageParser.parse_html(html)
    }

    #[test]
    fn test_extract_title() {
        let page = parse(r#"<html><head><title>Test Page</title></head><body></body></html>"#);
        assert_eq!(page.title, "Test Page");
    }

    #[test]
    fn test_extract_title_with_whitespace() {
        let page = parse(r#"<html><head><title>  Test Page  </title></head><body></body></html>"#);
        assert_eq!(page.title, "Test Page");
    }

    #[test]
    fn test_missing_title_uses_placeholder() {
        let page = parse(r#"<html><head></head><body></body></html>"#);
        assert_eq!(page.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_empty_title_uses_placeholder() {
        let page = parse(r#"<html><head><title> </title></head><body></body></html>"#);
        assert_eq!(page.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_hrefs_are_raw_and_ordered() {
        let page = parse(
            r##"<html><body>
            <a href="/b">B</a>
            <a href="#frag">Frag</a>
            <a href="https://other.example/">Other</a>
            <a href="mailto:x@example.com">Mail</a>
            </body></html>"##,
        );
        // No filtering here, the engine classifies later
        assert_eq!(
            page.links,
            vec!["/b", "#frag", "https://other.example/", "mailto:x@example.com"]
        );
    }

    #[test]
    fn test_empty_hrefs_skipped() {
        let page = parse(r#"<html><body><a href="">Empty</a><a href="/ok">Ok</a></body></html>"#);
        assert_eq!(page.links, vec!["/ok"]);
    }

    #[test]
    fn test_anchor_without_href_skipped() {
        let page = parse(r#"<html><body><a name="here">No href</a></body></html>"#);
        assert!(page.links.is_empty());
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        // Tree-builder recovery may clone the anchor around the misnested
        // <div>, so the href can appear more than once
        let page = parse("<html><body><a href='/x'><div></a></body>");
        assert!(!page.links.is_empty());
        assert!(page.links.iter().all(|href| href == "/x"));
        assert_eq!(page.title, DEFAULT_TITLE);
    }
}
