//! # Request Context Resolution
//!
//! Derives the effective relying-party identity for one request from the
//! configured values and the request's `Origin`/`Host` headers. Resolution is
//! deterministic and side-effect-free; malformed header values degrade to the
//! next fallback instead of failing the request.

use url::Url;

use crate::config::RelyingPartyConfig;

/// Per-request relying-party overrides.
///
/// Resolved once at the HTTP boundary and passed through the ceremony
/// operations; never persisted. Absent fields fall back to the
/// orchestrator's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasskeyContext {
    pub rp_id: Option<String>,
    pub rp_name: Option<String>,
    pub origin: Option<String>,
}

/// Resolve the context for a request.
///
/// Precedence:
/// 1. `origin`: configured origin, else the `Origin` header, else
///    `http://` + the `Host` header, else absent.
/// 2. `rp_id`: configured id, else the hostname of the resolved origin
///    (invalid URLs are ignored), else the `Host` header up to the first
///    `:`, else absent.
/// 3. `rp_name`: configured name, else absent.
pub fn resolve_context(
    config: &RelyingPartyConfig,
    origin_header: Option<&str>,
    host_header: Option<&str>,
) -> PasskeyContext {
    let origin = config
        .origin
        .clone()
        .or_else(|| origin_header.map(str::to_owned))
        .or_else(|| host_header.map(|host| format!("http://{host}")));

    let mut rp_id = config.rp_id.clone();
    if rp_id.is_none() {
        if let Some(origin) = origin.as_deref() {
            rp_id = Url::parse(origin)
                .ok()
                .and_then(|url| url.host_str().map(str::to_owned));
        }
    }
    if rp_id.is_none() {
        if let Some(host) = host_header {
            rp_id = host.split(':').next().map(str::to_owned);
        }
    }

    PasskeyContext {
        rp_id,
        rp_name: config.rp_name.clone(),
        origin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_config() -> RelyingPartyConfig {
        RelyingPartyConfig::default()
    }

    #[test]
    fn derives_rp_id_from_origin_header() {
        let context = resolve_context(
            &empty_config(),
            Some("https://example.com:3000"),
            Some("example.com:3000"),
        );

        assert_eq!(context.rp_id.as_deref(), Some("example.com"));
        assert_eq!(context.origin.as_deref(), Some("https://example.com:3000"));
        assert_eq!(context.rp_name, None);
    }

    #[test]
    fn configured_values_win_over_headers() {
        let config = RelyingPartyConfig {
            rp_id: Some("configured.example".into()),
            rp_name: Some("Configured".into()),
            origin: Some("https://configured.example".into()),
        };

        let context = resolve_context(&config, Some("https://other.example"), Some("other.example"));

        assert_eq!(context.rp_id.as_deref(), Some("configured.example"));
        assert_eq!(context.rp_name.as_deref(), Some("Configured"));
        assert_eq!(context.origin.as_deref(), Some("https://configured.example"));
    }

    #[test]
    fn invalid_origin_falls_through_to_host_header() {
        let context = resolve_context(&empty_config(), Some("not a url"), Some("fallback.example:8443"));

        // The Origin header still wins as the origin value, but rp id comes
        // from the Host header once URL parsing fails.
        assert_eq!(context.origin.as_deref(), Some("not a url"));
        assert_eq!(context.rp_id.as_deref(), Some("fallback.example"));
    }

    #[test]
    fn host_header_alone_yields_http_origin() {
        let context = resolve_context(&empty_config(), None, Some("dev.example:3000"));

        assert_eq!(context.origin.as_deref(), Some("http://dev.example:3000"));
        assert_eq!(context.rp_id.as_deref(), Some("dev.example"));
    }

    #[test]
    fn no_signals_yield_empty_context() {
        let context = resolve_context(&empty_config(), None, None);

        assert_eq!(context, PasskeyContext::default());
    }
}
