//! Synthetic offline document for navigations that reach neither the cache
//! nor the network.

use shellcache_core::{Response, ResponseType};
use url::Url;

/// Build the offline fallback response for a failed navigation to `url`.
///
/// The page is self-contained (no subresources) and its only control
/// reloads whatever address is currently loaded.
pub fn offline_response(url: &Url, app_name: &str) -> Response {
    Response::new(
        url.clone(),
        200,
        ResponseType::Basic,
        vec![("Content-Type".to_string(), "text/html".to_string())],
        offline_page(app_name),
    )
}

/// Render the offline document.
pub fn offline_page(app_name: &str) -> String {
    let name = escape_html(app_name);

    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name} - Offline</title>
  </head>
  <body style="font-family: Arial, sans-serif; text-align: center; padding: 50px; background: #10B981; color: white;">
    <h1>{name}</h1>
    <h2>You are offline</h2>
    <p>This page could not be loaded. Check your connection and try again.</p>
    <button onclick="window.location.reload()" style="padding: 10px 20px; background: white; color: #10B981; border: none; border-radius: 5px; font-size: 16px;">
      Retry
    </button>
  </body>
</html>
"#
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_response_headers() {
        let url = Url::parse("https://app.test/orders").unwrap();
        let response = offline_response(&url, "Shop");
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("text/html"));
        assert_eq!(response.url, url);
    }

    #[test]
    fn test_offline_page_reloads_current_location() {
        let page = offline_page("Shop");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains(r#"onclick="window.location.reload()""#));
        assert!(!page.contains("href="));
        assert!(page.contains("<h1>Shop</h1>"));
    }

    #[test]
    fn test_offline_page_escapes_app_name() {
        let page = offline_page("<Tom & Jerry's>");
        assert!(page.contains("&lt;Tom &amp; Jerry&#39;s&gt;"));
        assert!(!page.contains("<Tom"));
    }
}
