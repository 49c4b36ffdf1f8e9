//! Request classification.
//!
//! Decides whether a request participates in caching at all. Requests that
//! do not use a network scheme, or that match one of the configured
//! exclusion rules, are left to the host's default network handling.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// A predicate that routes matching requests around the cache.
///
/// Serialized externally tagged, so a TOML config reads
/// `exclusions = [{ contains = "api" }, { host_suffix = "vercel.app" }]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionRule {
    /// Substring anywhere in the serialized URL.
    Contains(String),
    /// Exact host match (case-insensitive).
    Host(String),
    /// Host equals the suffix or ends with `.suffix`.
    HostSuffix(String),
    /// Path starts with the given prefix.
    PathPrefix(String),
}

impl ExclusionRule {
    pub fn matches(&self, url: &Url) -> bool {
        match self {
            ExclusionRule::Contains(needle) => url.as_str().contains(needle.as_str()),
            ExclusionRule::Host(host) => url.host_str().is_some_and(|h| h.eq_ignore_ascii_case(host)),
            ExclusionRule::HostSuffix(suffix) => url.host_str().is_some_and(|h| {
                let h = h.to_ascii_lowercase();
                let suffix = suffix.trim_start_matches('.').to_ascii_lowercase();
                h == suffix || h.ends_with(&format!(".{suffix}"))
            }),
            ExclusionRule::PathPrefix(prefix) => url.path().starts_with(prefix.as_str()),
        }
    }

    /// The configured value, regardless of rule kind.
    pub fn value(&self) -> &str {
        match self {
            ExclusionRule::Contains(v)
            | ExclusionRule::Host(v)
            | ExclusionRule::HostSuffix(v)
            | ExclusionRule::PathPrefix(v) => v,
        }
    }
}

impl fmt::Display for ExclusionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionRule::Contains(v) => write!(f, "contains({v})"),
            ExclusionRule::Host(v) => write!(f, "host({v})"),
            ExclusionRule::HostSuffix(v) => write!(f, "host_suffix({v})"),
            ExclusionRule::PathPrefix(v) => write!(f, "path_prefix({v})"),
        }
    }
}

/// Outcome of classifying one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Scheme is not http/https.
    NonNetworkScheme,
    /// Matched the given exclusion rule.
    Excluded(ExclusionRule),
    /// Participates in cache-first handling.
    Eligible,
}

impl Classification {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Classification::Eligible)
    }
}

/// Classify a request target. Rules are checked in order; the first match wins.
pub fn classify(url: &Url, exclusions: &[ExclusionRule]) -> Classification {
    if !matches!(url.scheme(), "http" | "https") {
        return Classification::NonNetworkScheme;
    }

    match exclusions.iter().find(|rule| rule.matches(url)) {
        Some(rule) => Classification::Excluded(rule.clone()),
        None => Classification::Eligible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn default_rules() -> Vec<ExclusionRule> {
        vec![ExclusionRule::Contains("api".into()), ExclusionRule::Contains("vercel".into())]
    }

    #[test]
    fn test_non_network_schemes() {
        for target in ["chrome-extension://abc/script.js", "data:text/plain,hi", "blob:https://app.test/1", "file:///x"] {
            assert_eq!(classify(&url(target), &default_rules()), Classification::NonNetworkScheme, "{target}");
        }
    }

    #[test]
    fn test_contains_rules() {
        let rules = default_rules();
        assert_eq!(
            classify(&url("https://app.test/api/orders"), &rules),
            Classification::Excluded(ExclusionRule::Contains("api".into()))
        );
        assert_eq!(
            classify(&url("https://my-app.vercel.app/index.html"), &rules),
            Classification::Excluded(ExclusionRule::Contains("vercel".into()))
        );
        assert!(classify(&url("https://app.test/app.js"), &rules).is_eligible());
    }

    #[test]
    fn test_no_rules_everything_http_is_eligible() {
        assert!(classify(&url("http://app.test/api/orders"), &[]).is_eligible());
    }

    #[test]
    fn test_host_rules() {
        let rules = vec![ExclusionRule::Host("API.example.com".into())];
        assert!(!classify(&url("https://api.example.com/v1"), &rules).is_eligible());
        assert!(classify(&url("https://www.example.com/v1"), &rules).is_eligible());
    }

    #[test]
    fn test_host_suffix_requires_label_boundary() {
        let rule = ExclusionRule::HostSuffix("vercel.app".into());
        assert!(rule.matches(&url("https://vercel.app/")));
        assert!(rule.matches(&url("https://my-app.vercel.app/")));
        assert!(!rule.matches(&url("https://notvercel.app/")));
    }

    #[test]
    fn test_path_prefix() {
        let rule = ExclusionRule::PathPrefix("/api/".into());
        assert!(rule.matches(&url("https://app.test/api/orders")));
        assert!(!rule.matches(&url("https://app.test/capital/api")));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = vec![ExclusionRule::PathPrefix("/api".into()), ExclusionRule::Contains("api".into())];
        assert_eq!(
            classify(&url("https://app.test/api/x"), &rules),
            Classification::Excluded(ExclusionRule::PathPrefix("/api".into()))
        );
    }

    #[test]
    fn test_rule_serde_shape() {
        let rule: ExclusionRule = serde_json::from_str(r#"{"host_suffix":"vercel.app"}"#).unwrap();
        assert_eq!(rule, ExclusionRule::HostSuffix("vercel.app".into()));
        assert_eq!(rule.value(), "vercel.app");
        assert_eq!(rule.to_string(), "host_suffix(vercel.app)");
    }
}
