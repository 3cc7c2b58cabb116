//! Host classification and effective-host selection.

use std::collections::HashSet;

use http::HeaderMap;
use serde::Serialize;
use talimy_security::TenantSlug;

use crate::config::TenancyConfig;

const LOOPBACK_V4: &str = "127.0.0.1";
const LOCALHOST: &str = "localhost";

/// Product zone a hostname belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostScope {
    Api,
    #[serde(rename = "platform")]
    PlatformAdmin,
    Public,
    School { slug: TenantSlug },
}

impl HostScope {
    #[must_use]
    pub fn school_slug(&self) -> Option<&TenantSlug> {
        match self {
            HostScope::School { slug } => Some(slug),
            _ => None,
        }
    }
}

/// Pure hostname to [`HostScope`] mapping.
#[derive(Debug, Clone)]
pub struct HostClassifier {
    base_domain: String,
    dev_base_domain: String,
    api_host: String,
    platform_host: String,
    www_host: String,
    school_suffixes: [String; 2],
    reserved: HashSet<String>,
}

impl HostClassifier {
    #[must_use]
    pub fn new(config: &TenancyConfig) -> Self {
        let base = normalize_domain(&config.base_domain);
        let dev = normalize_domain(&config.dev_base_domain);
        Self {
            api_host: format!("api.{base}"),
            platform_host: format!("platform.{base}"),
            www_host: format!("www.{base}"),
            school_suffixes: [format!(".{dev}"), format!(".{base}")],
            reserved: config
                .reserved_subdomains
                .iter()
                .map(|label| label.trim().to_ascii_lowercase())
                .collect(),
            base_domain: base,
            dev_base_domain: dev,
        }
    }

    /// Classify a raw host value (may carry a port). Never fails.
    #[must_use]
    pub fn classify(&self, raw_host: &str) -> HostScope {
        let hostname = hostname_of(raw_host);

        if hostname == self.api_host {
            return HostScope::Api;
        }
        if hostname == self.platform_host {
            return HostScope::PlatformAdmin;
        }
        if hostname == self.base_domain
            || hostname == self.www_host
            || hostname == self.dev_base_domain
            || hostname == LOOPBACK_V4
        {
            return HostScope::Public;
        }

        for suffix in &self.school_suffixes {
            if let Some(prefix) = hostname.strip_suffix(suffix.as_str()) {
                let label = prefix.split('.').next().unwrap_or_default();
                if label.is_empty() || self.reserved.contains(label) {
                    return HostScope::Public;
                }
                return TenantSlug::parse(label)
                    .map_or(HostScope::Public, |slug| HostScope::School { slug });
            }
        }

        HostScope::Public
    }

    /// Whether `raw_host` belongs to the platform (base domains, their
    /// subdomains, `localhost` and `*.localhost`, or loopback).
    #[must_use]
    pub fn is_recognized(&self, raw_host: &str) -> bool {
        let hostname = hostname_of(raw_host);
        hostname == self.base_domain
            || hostname == self.dev_base_domain
            || hostname == LOOPBACK_V4
            || hostname == LOCALHOST
            || hostname.ends_with(".localhost")
            || self
                .school_suffixes
                .iter()
                .any(|suffix| hostname.ends_with(suffix.as_str()))
    }

    /// Pick the host the client actually addressed.
    ///
    /// Candidates come from `x-forwarded-host` (comma separated), then the
    /// `host=` parameters of `forwarded`, then `host`. The first recognized
    /// candidate wins, else the first candidate, else the empty string.
    #[must_use]
    pub fn effective_host(&self, headers: &HeaderMap) -> String {
        let mut candidates = split_host_values(header_str(headers, "x-forwarded-host"));
        candidates.extend(forwarded_hosts(header_str(headers, "forwarded")));
        candidates.extend(split_host_values(header_str(headers, http::header::HOST.as_str())));

        let chosen = candidates
            .iter()
            .position(|candidate| self.is_recognized(candidate))
            .unwrap_or(0);
        candidates.into_iter().nth(chosen).unwrap_or_default()
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_matches('.').to_ascii_lowercase()
}

/// Lowercased hostname without port or trailing dot.
fn hostname_of(raw_host: &str) -> String {
    let host = raw_host.trim().to_ascii_lowercase();
    let without_port = if let Some(rest) = host.strip_prefix('[') {
        rest.split(']').next().unwrap_or_default()
    } else {
        host.split(':').next().unwrap_or_default()
    };
    without_port.trim_end_matches('.').to_owned()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn split_host_values(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

/// `host=` parameters of an RFC 7239 `forwarded` header, one per element.
fn forwarded_hosts(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.split(',')
        .filter_map(|element| {
            element.split(';').find_map(|pair| {
                let (key, value) = pair.split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("host")
                    .then(|| value.trim().trim_matches('"').trim().to_owned())
            })
        })
        .filter(|host| !host.is_empty())
        .collect()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn classifier() -> HostClassifier {
        HostClassifier::new(&TenancyConfig::default())
    }

    fn school(slug: &str) -> HostScope {
        HostScope::School {
            slug: TenantSlug::parse(slug).unwrap(),
        }
    }

    #[test]
    fn canonical_hosts() {
        let c = classifier();
        assert_eq!(c.classify("api.talimy.space"), HostScope::Api);
        assert_eq!(c.classify("platform.talimy.space:443"), HostScope::PlatformAdmin);
        assert_eq!(c.classify("talimy.space"), HostScope::Public);
        assert_eq!(c.classify("WWW.Talimy.Space"), HostScope::Public);
        assert_eq!(c.classify("localhost:3000"), HostScope::Public);
        assert_eq!(c.classify("127.0.0.1:8080"), HostScope::Public);
    }

    #[test]
    fn school_subdomains() {
        let c = classifier();
        assert_eq!(c.classify("School-7.talimy.space"), school("school-7"));
        assert_eq!(c.classify("alpha.localhost:3000"), school("alpha"));
        assert_eq!(c.classify("alpha.talimy.space."), school("alpha"));
    }

    #[test]
    fn reserved_leading_label_is_never_a_school() {
        let c = classifier();
        for label in ["www", "api", "platform", "localhost"] {
            for base in ["talimy.space", "localhost"] {
                for host in [format!("{label}.{base}"), format!("{label}.x.{base}")] {
                    let scope = c.classify(&host);
                    assert!(scope.school_slug().is_none(), "{host} classified as {scope:?}");
                }
            }
        }
    }

    #[test]
    fn classification_is_stable() {
        let c = classifier();
        assert_eq!(c.classify("school-7.talimy.space"), c.classify("school-7.talimy.space"));
    }

    #[test]
    fn foreign_and_empty_hosts_are_public() {
        let c = classifier();
        assert_eq!(c.classify("example.com"), HostScope::Public);
        assert_eq!(c.classify("eviltalimy.space"), HostScope::Public);
        assert_eq!(c.classify(""), HostScope::Public);
        assert_eq!(c.classify(".talimy.space"), HostScope::Public);
        assert_eq!(c.classify("[::1]:8080"), HostScope::Public);
    }

    #[test]
    fn custom_base_domain_and_reserved_set() {
        let c = HostClassifier::new(&TenancyConfig {
            base_domain: "school.example".to_owned(),
            reserved_subdomains: vec!["admin".to_owned()],
            ..TenancyConfig::default()
        });
        assert_eq!(c.classify("api.school.example"), HostScope::Api);
        assert_eq!(c.classify("admin.school.example"), HostScope::Public);
        assert_eq!(c.classify("beta.school.example"), school("beta"));
        assert_eq!(c.classify("beta.talimy.space"), HostScope::Public);
    }

    #[test]
    fn effective_host_prefers_recognized_forwarded_candidate() {
        let c = classifier();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-host", HeaderValue::from_static("proxy.internal, alpha.talimy.space"));
        headers.insert("host", HeaderValue::from_static("origin.internal:8080"));
        assert_eq!(c.effective_host(&headers), "alpha.talimy.space");
    }

    #[test]
    fn effective_host_reads_forwarded_header() {
        let c = classifier();
        let mut headers = HeaderMap::new();
        headers.insert(
            "forwarded",
            HeaderValue::from_static("for=10.0.0.1;proto=https;Host=\"beta.talimy.space\""),
        );
        headers.insert("host", HeaderValue::from_static("origin.internal"));
        assert_eq!(c.effective_host(&headers), "beta.talimy.space");
    }

    #[test]
    fn effective_host_falls_back_to_first_candidate_then_empty() {
        let c = classifier();
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("origin.internal"));
        assert_eq!(c.effective_host(&headers), "origin.internal");
        assert_eq!(c.effective_host(&HeaderMap::new()), "");
    }

    #[test]
    fn host_scope_serializes_with_kind_tag() {
        assert_eq!(
            serde_json::to_value(school("alpha")).unwrap(),
            serde_json::json!({"kind": "school", "slug": "alpha"})
        );
        assert_eq!(
            serde_json::to_value(HostScope::PlatformAdmin).unwrap(),
            serde_json::json!({"kind": "platform"})
        );
    }

    #[test]
    fn localhost_is_recognized_under_any_dev_base_domain() {
        let c = HostClassifier::new(&TenancyConfig {
            dev_base_domain: "talimy.test".to_owned(),
            ..TenancyConfig::default()
        });
        assert!(c.is_recognized("localhost:3000"));
        assert!(c.is_recognized("alpha.localhost"));
        assert!(c.is_recognized("beta.talimy.test"));
        assert!(!c.is_recognized("origin.internal"));
        assert!(!c.is_recognized("notlocalhost"));

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-host", HeaderValue::from_static("proxy.internal, alpha.localhost:3000"));
        assert_eq!(c.effective_host(&headers), "alpha.localhost:3000");
    }
}
