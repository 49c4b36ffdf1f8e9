//! URL resolution for manifest entries and host-supplied request targets.

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a URL string against the application origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative paths (`/index.html`, `manifest.json`) against `base`
/// 3. Keep absolute URLs of any scheme as they are, so that classification
///    can still see non-network schemes
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn resolve(base: &url::Url, input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("https://app.test/shop/").unwrap()
    }

    #[test]
    fn test_resolve_absolute_path() {
        let url = resolve(&origin(), "/index.html").unwrap();
        assert_eq!(url.as_str(), "https://app.test/index.html");
    }

    #[test]
    fn test_resolve_relative_path_under_scope() {
        let url = resolve(&origin(), "manifest.json").unwrap();
        assert_eq!(url.as_str(), "https://app.test/shop/manifest.json");
    }

    #[test]
    fn test_resolve_keeps_absolute_urls() {
        let url = resolve(&origin(), "https://cdn.test/lib.js").unwrap();
        assert_eq!(url.as_str(), "https://cdn.test/lib.js");
    }

    #[test]
    fn test_resolve_keeps_other_schemes() {
        let url = resolve(&origin(), "chrome-extension://abc/inject.js").unwrap();
        assert_eq!(url.scheme(), "chrome-extension");
    }

    #[test]
    fn test_resolve_lowercase_host() {
        let url = resolve(&origin(), "https://APP.TEST/x").unwrap();
        assert_eq!(url.host_str(), Some("app.test"));
    }

    #[test]
    fn test_resolve_remove_fragment_preserve_query() {
        let url = resolve(&origin(), "/index.html?v=3#top").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), Some("v=3"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /  ").unwrap();
        assert_eq!(url.as_str(), "https://app.test/");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_invalid() {
        assert!(matches!(resolve(&origin(), "https://exa mple.com/"), Err(UrlError::InvalidUrl(_))));
    }
}
