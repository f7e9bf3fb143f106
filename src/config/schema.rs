//! Configuration schema definitions.
//!
//! This module defines the complete configuration aggregate for the gatekeeper.
//! Field names on disk are the kebab-case forms of the Rust field names, which
//! are also the command line flag names.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::resource::Resource;
use crate::config::scalar;

/// Root configuration for the gatekeeper.
///
/// Maps and sequences always start out empty rather than absent, so overlays
/// can append or merge without checking for a missing base.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    // -- network --
    /// Interface the service listens on (e.g., "127.0.0.1:3000").
    #[serde(deserialize_with = "scalar::string")]
    pub listen: String,

    /// Upstream endpoint requests are proxied to.
    #[serde(deserialize_with = "scalar::string")]
    pub upstream_url: String,

    #[serde(deserialize_with = "scalar::string")]
    pub tls_cert: String,
    #[serde(deserialize_with = "scalar::string")]
    pub tls_private_key: String,

    /// CA certificate used for mutual TLS.
    #[serde(deserialize_with = "scalar::string")]
    pub tls_ca_certificate: String,

    /// Client certificate for outbound connections.
    #[serde(deserialize_with = "scalar::string")]
    pub tls_client_certificate: String,

    pub enable_proxy_protocol: bool,

    /// Maximum time a dial to the upstream waits to connect.
    #[serde(with = "humantime_serde")]
    pub upstream_timeout: Duration,

    /// Keep-alive period for upstream connections.
    #[serde(with = "humantime_serde")]
    pub upstream_keepalive_timeout: Duration,

    pub upstream_keepalives: bool,

    /// Expiry of an unused access cookie; zero disables it.
    #[serde(with = "humantime_serde")]
    pub idle_duration: Duration,

    // -- identity / oauth --
    #[serde(deserialize_with = "scalar::string")]
    pub client_id: String,
    #[serde(deserialize_with = "scalar::string")]
    pub client_secret: String,

    /// OpenID provider discovery endpoint.
    #[serde(deserialize_with = "scalar::string")]
    pub discovery_url: String,

    /// Endpoint used to revoke refresh tokens.
    #[serde(deserialize_with = "scalar::string")]
    pub revocation_url: String,

    /// Scopes requested when authenticating, in order.
    #[serde(deserialize_with = "scalar::string_list")]
    pub scopes: Vec<String>,

    /// Callback base for the OAuth flow.
    #[serde(deserialize_with = "scalar::string")]
    pub redirection_url: String,

    /// Session store backend, e.g. redis://127.0.0.1:6379.
    #[serde(deserialize_with = "scalar::string")]
    pub store_url: String,

    /// Bypass token verification; expiry and roles are still enforced.
    pub skip_token_verification: bool,

    pub skip_upstream_tls_verify: bool,

    // -- session / cookies --
    #[serde(deserialize_with = "scalar::string")]
    pub cookie_access_name: String,
    #[serde(deserialize_with = "scalar::string")]
    pub cookie_refresh_name: String,
    #[serde(deserialize_with = "scalar::string")]
    pub cookie_domain: String,
    pub secure_cookie: bool,

    /// AES key (16 or 32 chars) for the refresh token cookie.
    #[serde(deserialize_with = "scalar::string")]
    pub encryption_key: String,

    pub enable_refresh_tokens: bool,

    // -- access control --
    pub resources: Vec<Resource>,

    /// Claim name to required regex.
    #[serde(deserialize_with = "scalar::string_map")]
    pub match_claims: HashMap<String, String>,

    /// Extra claims injected into upstream headers.
    #[serde(deserialize_with = "scalar::string_list")]
    pub add_claims: Vec<String>,

    /// Custom headers added to upstream requests.
    #[serde(deserialize_with = "scalar::string_map")]
    pub headers: HashMap<String, String>,

    /// Data passed to the sign-in and forbidden templates.
    #[serde(deserialize_with = "scalar::string_map")]
    pub tags: HashMap<String, String>,

    /// Hostnames the service responds to; empty means all.
    #[serde(deserialize_with = "scalar::string_list")]
    pub hostnames: Vec<String>,

    // -- forwarding --
    pub enable_forwarding: bool,
    #[serde(deserialize_with = "scalar::string")]
    pub forwarding_username: String,
    #[serde(deserialize_with = "scalar::string")]
    pub forwarding_password: String,

    /// Domains whose requests are signed; everything else is relayed unsigned.
    #[serde(deserialize_with = "scalar::string_list")]
    pub forwarding_domains: Vec<String>,

    #[serde(flatten)]
    pub cors: CorsConfig,

    // -- pages / ops --
    #[serde(deserialize_with = "scalar::string")]
    pub sign_in_page: String,
    #[serde(deserialize_with = "scalar::string")]
    pub forbidden_page: String,
    pub enable_metrics: bool,
    pub json_logging: bool,
    pub log_requests: bool,
    pub verbose: bool,
    pub enable_security_filter: bool,

    /// Answer unauthenticated requests with 401 instead of a redirect.
    pub no_redirects: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".to_string(),
            upstream_url: String::new(),
            tls_cert: String::new(),
            tls_private_key: String::new(),
            tls_ca_certificate: String::new(),
            tls_client_certificate: String::new(),
            enable_proxy_protocol: false,
            upstream_timeout: Duration::from_secs(10),
            upstream_keepalive_timeout: Duration::from_secs(10),
            upstream_keepalives: true,
            idle_duration: Duration::ZERO,
            client_id: String::new(),
            client_secret: String::new(),
            discovery_url: String::new(),
            revocation_url: "/oauth2/revoke".to_string(),
            scopes: Vec::new(),
            redirection_url: String::new(),
            store_url: String::new(),
            skip_token_verification: false,
            skip_upstream_tls_verify: true,
            cookie_access_name: "kc-access".to_string(),
            cookie_refresh_name: "kc-state".to_string(),
            cookie_domain: String::new(),
            secure_cookie: true,
            encryption_key: String::new(),
            enable_refresh_tokens: false,
            resources: Vec::new(),
            match_claims: HashMap::new(),
            add_claims: Vec::new(),
            headers: HashMap::new(),
            tags: HashMap::new(),
            hostnames: Vec::new(),
            enable_forwarding: false,
            forwarding_username: String::new(),
            forwarding_password: String::new(),
            forwarding_domains: Vec::new(),
            cors: CorsConfig::default(),
            sign_in_page: String::new(),
            forbidden_page: String::new(),
            enable_metrics: false,
            json_logging: true,
            log_requests: true,
            verbose: false,
            enable_security_filter: false,
            no_redirects: false,
        }
    }
}

impl Config {
    /// True when a custom sign-in template is configured.
    pub fn has_custom_sign_in_page(&self) -> bool {
        !self.sign_in_page.is_empty()
    }

    /// True when a custom forbidden template is configured.
    pub fn has_custom_forbidden_page(&self) -> bool {
        !self.forbidden_page.is_empty()
    }
}

/// Cross-origin resource sharing settings.
///
/// Stored flat in the config file under `cors-*` keys.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Access-Control-Allow-Origin
    #[serde(rename = "cors-origins", deserialize_with = "scalar::string_list")]
    pub origins: Vec<String>,

    /// Access-Control-Allow-Methods
    #[serde(rename = "cors-methods", deserialize_with = "scalar::string_list")]
    pub methods: Vec<String>,

    /// Access-Control-Allow-Headers
    #[serde(rename = "cors-headers", deserialize_with = "scalar::string_list")]
    pub headers: Vec<String>,

    /// Access-Control-Expose-Headers
    #[serde(rename = "cors-exposed-headers", deserialize_with = "scalar::string_list")]
    pub exposed_headers: Vec<String>,

    /// Access-Control-Max-Age
    #[serde(rename = "cors-max-age", with = "humantime_serde")]
    pub max_age: Duration,

    /// Access-Control-Allow-Credentials
    #[serde(rename = "cors-credentials")]
    pub credentials: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.listen, "127.0.0.1:3000");
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert_eq!(config.upstream_keepalive_timeout, Duration::from_secs(10));
        assert_eq!(config.cookie_access_name, "kc-access");
        assert_eq!(config.cookie_refresh_name, "kc-state");
        assert!(config.secure_cookie);
        assert!(config.skip_upstream_tls_verify);
        assert!(config.upstream_url.is_empty());
    }

    #[test]
    fn test_default_containers_are_empty() {
        let config = Config::default();
        assert!(config.resources.is_empty());
        assert!(config.match_claims.is_empty());
        assert!(config.headers.is_empty());
        assert!(config.tags.is_empty());
        assert!(config.scopes.is_empty());
        assert!(config.hostnames.is_empty());
        assert!(config.add_claims.is_empty());
        assert!(config.forwarding_domains.is_empty());
        assert_eq!(config.cors, CorsConfig::default());
    }

    #[test]
    fn test_custom_pages() {
        let mut config = Config::default();
        assert!(!config.has_custom_sign_in_page());
        assert!(!config.has_custom_forbidden_page());

        config.sign_in_page = "templates/sign_in.html".into();
        config.forbidden_page = "templates/forbidden.html".into();
        assert!(config.has_custom_sign_in_page());
        assert!(config.has_custom_forbidden_page());
    }

    #[test]
    fn test_kebab_case_keys() {
        let value = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(value["listen"], "127.0.0.1:3000");
        assert_eq!(value["upstream-timeout"], "10s");
        assert_eq!(value["cookie-access-name"], "kc-access");
        assert!(value["cors-origins"].is_array());
        assert!(value.get("cors").is_none());
    }
}
