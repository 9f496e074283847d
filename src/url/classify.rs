use crate::{UrlError, UrlResult};
use url::Url;

/// Returns true for hrefs that reference an element on the same page
///
/// # Examples
///
/// ```
/// use sitegraph::url::is_fragment_reference;
///
/// assert!(is_fragment_reference("#section"));
/// assert!(!is_fragment_reference("/about#section"));
/// ```
pub fn is_fragment_reference(href: &str) -> bool {
    href.starts_with('#')
}

/// Returns true for root-relative hrefs (`/path`)
///
/// Only root-relative links are resolved against the site base; any other
/// non-absolute href later fails the scheme check and is dropped.
pub fn is_relative(href: &str) -> bool {
    href.starts_with('/')
}

/// Returns true if the URL uses an http or https scheme
pub fn is_http_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Returns true if `host` belongs to the site rooted at `seed_host`
///
/// A host is internal when it equals the seed host exactly or is a
/// dot-separated subdomain of it. A plain suffix match would also accept
/// unrelated hosts like `notexample.com` for `example.com`, so the
/// separator is required.
///
/// # Examples
///
/// ```
/// use sitegraph::url::is_internal_host;
///
/// assert!(is_internal_host("example.com", "example.com"));
/// assert!(is_internal_host("blog.example.com", "example.com"));
/// assert!(!is_internal_host("notexample.com", "example.com"));
/// assert!(!is_internal_host("example.com.evil.net", "example.com"));
/// ```
pub fn is_internal_host(host: &str, seed_host: &str) -> bool {
    host == seed_host
        || host
            .strip_suffix(seed_host)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Computes the site base URL (`scheme://host[:port]/`) of an absolute URL
pub fn site_base_url(url: &Url) -> UrlResult<Url> {
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let mut base = url.clone();
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    Ok(base)
}

/// Resolves a root-relative href against a site base URL
pub fn resolve_relative(href: &str, base: &Url) -> UrlResult<Url> {
    base.join(href)
        .map_err(|e| UrlError::Parse(format!("'{href}' against '{base}': {e}")))
}
