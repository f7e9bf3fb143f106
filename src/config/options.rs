//! Command line and environment overrides.
//!
//! # Merge Policy
//! - Scalars: an explicitly given value overwrites
//! - Lists: `--scope` replaces; every other list appends (no dedup)
//! - Key pairs (`--tag`, `--match-claims`, `--headers`): decoded then merged,
//!   the command line wins on key collision
//! - Resources: parsed and appended
//!
//! # Design Decisions
//! - Every field is an `Option`, so "given but empty" differs from "not given"
//! - All fallible decoding runs before the first field is written; a failed
//!   overlay returns no config at all, so nothing is ever half applied

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::keypairs::{decode_key_pairs, merge_maps};
use crate::config::loader::ConfigError;
use crate::config::resource::Resource;
use crate::config::schema::Config;

/// Command line options for the gatekeeper.
///
/// Defaults shown in the help text are those of `Config::default()`.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "gatekeeper", version)]
#[command(about = "Configuration front end for the OAuth2 gatekeeper proxy", long_about = None)]
pub struct Options {
    /// the path to the configuration file for the gatekeeper
    #[arg(long, env = "PROXY_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// the interface the service should be listening on [default: 127.0.0.1:3000]
    #[arg(long, env = "PROXY_LISTEN")]
    pub listen: Option<String>,

    /// the client secret used to authenticate to the oauth server (access_type: confidential)
    #[arg(long, env = "PROXY_CLIENT_SECRET")]
    pub client_secret: Option<String>,

    /// the client id used to authenticate to the oauth service
    #[arg(long, env = "PROXY_CLIENT_ID")]
    pub client_id: Option<String>,

    /// the discovery url to retrieve the openid configuration
    #[arg(long, env = "PROXY_DISCOVERY_URL")]
    pub discovery_url: Option<String>,

    /// a scope requested when authenticating the user, may be repeated
    #[arg(long = "scope", value_name = "SCOPE")]
    pub scopes: Option<Vec<String>>,

    /// the expiration of the access token cookie, if not used within this time its removed
    #[arg(long, value_parser = humantime::parse_duration)]
    pub idle_duration: Option<Duration>,

    /// redirection url for the oauth callback url
    #[arg(long, env = "PROXY_REDIRECTION_URL")]
    pub redirection_url: Option<String>,

    /// the url for the revocation endpoint to revoke refresh token [default: /oauth2/revoke]
    #[arg(long, env = "PROXY_REVOCATION_URL")]
    pub revocation_url: Option<String>,

    /// url for the storage subsystem, e.g redis://127.0.0.1:6379, file:///etc/tokens.file
    #[arg(long, env = "PROXY_STORE_URL")]
    pub store_url: Option<String>,

    /// the url for the upstream endpoint you wish to proxy to
    #[arg(long, env = "PROXY_UPSTREAM_URL")]
    pub upstream_url: Option<String>,

    /// enables or disables the keepalive connections for upstream endpoint [default: true]
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub upstream_keepalives: Option<bool>,

    /// the maximum amount of time a dial will wait for a connect to complete [default: 10s]
    #[arg(long, value_parser = humantime::parse_duration)]
    pub upstream_timeout: Option<Duration>,

    /// the keep-alive period for an active network connection [default: 10s]
    #[arg(long, value_parser = humantime::parse_duration)]
    pub upstream_keepalive_timeout: Option<Duration>,

    /// enables the handling of the refresh tokens
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub enable_refresh_tokens: Option<bool>,

    /// enforces the cookie to be secure [default: true]
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub secure_cookie: Option<bool>,

    /// a domain the access cookie is available to, defaults host header
    #[arg(long)]
    pub cookie_domain: Option<String>,

    /// the name of the cookie use to hold the access token [default: kc-access]
    #[arg(long)]
    pub cookie_access_name: Option<String>,

    /// the name of the cookie used to hold the encrypted refresh token [default: kc-state]
    #[arg(long)]
    pub cookie_refresh_name: Option<String>,

    /// the encryption key used to encrypt the session state
    #[arg(long)]
    pub encryption_key: Option<String>,

    /// do not redirect when no authentication is present, 401 instead
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub no_redirects: Option<bool>,

    /// a hostname the service will respond to, may be repeated; defaults to all
    #[arg(long = "hostname", value_name = "HOSTNAME")]
    pub hostnames: Option<Vec<String>>,

    /// enable the prometheus metrics collector on /oauth/metrics
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub enable_metrics: Option<bool>,

    /// whether to enable proxy protocol
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub enable_proxy_protocol: Option<bool>,

    /// enables the forwarding proxy mode, signing outbound request
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub enable_forwarding: Option<bool>,

    /// the username to use when logging into the openid provider
    #[arg(long)]
    pub forwarding_username: Option<String>,

    /// the password to use when logging into the openid provider
    #[arg(long)]
    pub forwarding_password: Option<String>,

    /// a domain which should be signed, may be repeated; everything else is relayed unsigned
    #[arg(long, value_name = "DOMAIN")]
    pub forwarding_domains: Option<Vec<String>>,

    /// the path to a certificate file used for TLS
    #[arg(long)]
    pub tls_cert: Option<String>,

    /// the path to the private key for TLS support
    #[arg(long)]
    pub tls_private_key: Option<String>,

    /// the path to the ca certificate used for mutual TLS
    #[arg(long)]
    pub tls_ca_certificate: Option<String>,

    /// the path to the client certificate used for outbound connections
    #[arg(long)]
    pub tls_client_certificate: Option<String>,

    /// whether to skip the verification of any upstream TLS [default: true]
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub skip_upstream_tls_verify: Option<bool>,

    /// keypair for matching access token claims e.g. aud=myapp, iss=http://example.*
    #[arg(long, value_name = "CLAIM=REGEX")]
    pub match_claims: Option<Vec<String>>,

    /// an extra claim from the token to inject into headers, e.g given_name -> X-Auth-Given-Name
    #[arg(long, value_name = "CLAIM")]
    pub add_claims: Option<Vec<String>>,

    /// a resource 'uri=/admin|methods=GET|roles=role1,role2', may be repeated
    #[arg(long = "resource", value_name = "DESCRIPTOR")]
    pub resources: Option<Vec<String>>,

    /// a custom header added to the upstream request, key=value
    #[arg(long, value_name = "NAME=VALUE")]
    pub headers: Option<Vec<String>>,

    /// a custom template displayed for signin
    #[arg(long = "signin-page")]
    pub sign_in_page: Option<String>,

    /// a custom template used for access forbidden
    #[arg(long)]
    pub forbidden_page: Option<String>,

    /// keypair passed to the templates at render, e.g title='My Page'
    #[arg(long = "tag", value_name = "KEY=VALUE")]
    pub tags: Option<Vec<String>>,

    /// an origin added to the CORS origins control (Access-Control-Allow-Origin)
    #[arg(long, value_name = "ORIGIN")]
    pub cors_origins: Option<Vec<String>>,

    /// a method permitted in the access control (Access-Control-Allow-Methods)
    #[arg(long, value_name = "METHOD")]
    pub cors_methods: Option<Vec<String>>,

    /// a header added to the CORS access control (Access-Control-Allow-Headers)
    #[arg(long, value_name = "HEADER")]
    pub cors_headers: Option<Vec<String>>,

    /// a header exposed through CORS (Access-Control-Expose-Headers)
    #[arg(long, value_name = "HEADER")]
    pub cors_exposed_headers: Option<Vec<String>>,

    /// the max age applied to cors headers (Access-Control-Max-Age)
    #[arg(long, value_parser = humantime::parse_duration)]
    pub cors_max_age: Option<Duration>,

    /// the credentials access control header (Access-Control-Allow-Credentials)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub cors_credentials: Option<bool>,

    /// enables the security filter handler
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub enable_security_filter: Option<bool>,

    /// TESTING ONLY; bypass token verification, only expiration and roles enforced
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub skip_token_verification: Option<bool>,

    /// switch on json logging rather than text [default: true]
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub json_logging: Option<bool>,

    /// switch on logging of all incoming requests [default: true]
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub log_requests: Option<bool>,

    /// switch on debug / verbose logging
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub verbose: Option<bool>,
}

impl Options {
    /// Apply the explicitly given options onto `config`.
    pub fn overlay(&self, mut config: Config) -> Result<Config, ConfigError> {
        let tags = decode_option("tag", &self.tags)?;
        let match_claims = decode_option("match-claims", &self.match_claims)?;
        let headers = decode_option("headers", &self.headers)?;
        let resources = self.parse_resources()?;

        overwrite_non_empty(&mut config.listen, &self.listen);
        overwrite_non_empty(&mut config.client_secret, &self.client_secret);
        overwrite_non_empty(&mut config.client_id, &self.client_id);
        overwrite_non_empty(&mut config.discovery_url, &self.discovery_url);
        overwrite_non_empty(&mut config.upstream_url, &self.upstream_url);
        overwrite_non_empty(&mut config.revocation_url, &self.revocation_url);
        overwrite_non_empty(&mut config.store_url, &self.store_url);
        overwrite_non_empty(&mut config.redirection_url, &self.redirection_url);

        overwrite(&mut config.upstream_keepalives, &self.upstream_keepalives);
        overwrite(&mut config.upstream_timeout, &self.upstream_timeout);
        overwrite(&mut config.upstream_keepalive_timeout, &self.upstream_keepalive_timeout);
        overwrite(&mut config.idle_duration, &self.idle_duration);
        overwrite(&mut config.skip_token_verification, &self.skip_token_verification);
        overwrite(&mut config.skip_upstream_tls_verify, &self.skip_upstream_tls_verify);
        overwrite(&mut config.encryption_key, &self.encryption_key);
        overwrite(&mut config.secure_cookie, &self.secure_cookie);
        overwrite(&mut config.cookie_access_name, &self.cookie_access_name);
        overwrite(&mut config.cookie_refresh_name, &self.cookie_refresh_name);
        overwrite(&mut config.cookie_domain, &self.cookie_domain);
        overwrite(&mut config.no_redirects, &self.no_redirects);
        overwrite(&mut config.tls_cert, &self.tls_cert);
        overwrite(&mut config.tls_private_key, &self.tls_private_key);
        overwrite(&mut config.tls_ca_certificate, &self.tls_ca_certificate);
        overwrite(&mut config.tls_client_certificate, &self.tls_client_certificate);
        overwrite(&mut config.enable_metrics, &self.enable_metrics);
        overwrite(&mut config.enable_proxy_protocol, &self.enable_proxy_protocol);
        overwrite(&mut config.enable_forwarding, &self.enable_forwarding);
        overwrite(&mut config.enable_refresh_tokens, &self.enable_refresh_tokens);
        overwrite(&mut config.forwarding_username, &self.forwarding_username);
        overwrite(&mut config.forwarding_password, &self.forwarding_password);
        overwrite(&mut config.sign_in_page, &self.sign_in_page);
        overwrite(&mut config.forbidden_page, &self.forbidden_page);
        overwrite(&mut config.enable_security_filter, &self.enable_security_filter);
        overwrite(&mut config.json_logging, &self.json_logging);
        overwrite(&mut config.log_requests, &self.log_requests);
        overwrite(&mut config.verbose, &self.verbose);
        overwrite(&mut config.cors.max_age, &self.cors_max_age);
        overwrite(&mut config.cors.credentials, &self.cors_credentials);

        overwrite(&mut config.scopes, &self.scopes);
        append(&mut config.add_claims, &self.add_claims);
        append(&mut config.forwarding_domains, &self.forwarding_domains);
        append(&mut config.hostnames, &self.hostnames);
        append(&mut config.cors.origins, &self.cors_origins);
        append(&mut config.cors.methods, &self.cors_methods);
        append(&mut config.cors.headers, &self.cors_headers);
        append(&mut config.cors.exposed_headers, &self.cors_exposed_headers);

        if let Some(tags) = tags {
            merge_maps(&mut config.tags, tags);
        }
        if let Some(match_claims) = match_claims {
            merge_maps(&mut config.match_claims, match_claims);
        }
        if let Some(headers) = headers {
            merge_maps(&mut config.headers, headers);
        }
        config.resources.extend(resources);

        Ok(config)
    }

    fn parse_resources(&self) -> Result<Vec<Resource>, ConfigError> {
        let Some(descriptors) = &self.resources else {
            return Ok(Vec::new());
        };

        descriptors
            .iter()
            .map(|descriptor| {
                descriptor.parse::<Resource>().map_err(|source| ConfigError::Resource {
                    descriptor: descriptor.clone(),
                    source,
                })
            })
            .collect()
    }
}

fn decode_option(
    option: &'static str,
    pairs: &Option<Vec<String>>,
) -> Result<Option<HashMap<String, String>>, ConfigError> {
    pairs
        .as_deref()
        .map(decode_key_pairs)
        .transpose()
        .map_err(|source| ConfigError::KeyPair { option, source })
}

fn overwrite<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

// an explicitly empty value is treated as not given
fn overwrite_non_empty(target: &mut String, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        *target = value.to_string();
    }
}

fn append(target: &mut Vec<String>, values: &Option<Vec<String>>) {
    if let Some(values) = values {
        target.extend(values.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keypairs::KeyPairError;

    fn parse(args: &[&str]) -> Options {
        Options::try_parse_from(std::iter::once("gatekeeper").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_options_is_noop() {
        let config = Options::default().overlay(Config::default()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_scalars_overwrite() {
        let options = parse(&[
            "--listen",
            "0.0.0.0:80",
            "--upstream-url",
            "http://10.0.0.1",
            "--upstream-timeout",
            "5s",
            "--secure-cookie=false",
            "--enable-refresh-tokens",
            "--cookie-domain",
            "example.com",
            "--cors-max-age",
            "1h",
        ]);
        let config = options.overlay(Config::default()).unwrap();
        assert_eq!(config.listen, "0.0.0.0:80");
        assert_eq!(config.upstream_url, "http://10.0.0.1");
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert!(!config.secure_cookie);
        assert!(config.enable_refresh_tokens);
        assert_eq!(config.cookie_domain, "example.com");
        assert_eq!(config.cors.max_age, Duration::from_secs(3600));
    }

    #[test]
    fn test_empty_value_handling() {
        let mut base = Config::default();
        base.client_id = "from-file".into();
        base.encryption_key = "0123456789abcdef".into();

        let options = Options {
            listen: Some(String::new()),
            client_id: Some(String::new()),
            encryption_key: Some(String::new()),
            ..Options::default()
        };
        let config = options.overlay(base).unwrap();
        // empty is ignored for these
        assert_eq!(config.listen, "127.0.0.1:3000");
        assert_eq!(config.client_id, "from-file");
        // but is a legitimate override here
        assert_eq!(config.encryption_key, "");
    }

    #[test]
    fn test_scopes_replace_other_lists_append() {
        let mut base = Config::default();
        base.scopes = vec!["openid".into()];
        base.hostnames = vec!["a.example.com".into()];
        base.cors.origins = vec!["https://a.example.com".into()];

        let options = parse(&[
            "--scope",
            "email",
            "--scope",
            "profile",
            "--hostname",
            "a.example.com",
            "--cors-origins",
            "https://b.example.com",
            "--add-claims",
            "given_name",
            "--forwarding-domains",
            "api.example.com",
        ]);
        let config = options.overlay(base).unwrap();
        assert_eq!(config.scopes, vec!["email", "profile"]);
        assert_eq!(config.hostnames, vec!["a.example.com", "a.example.com"]);
        assert_eq!(config.cors.origins, vec!["https://a.example.com", "https://b.example.com"]);
        assert_eq!(config.add_claims, vec!["given_name"]);
        assert_eq!(config.forwarding_domains, vec!["api.example.com"]);
    }

    #[test]
    fn test_key_pairs_land_in_their_own_maps() {
        let mut base = Config::default();
        base.headers.insert("X-Env".into(), "dev".into());

        let options = parse(&[
            "--tag", "title=My Page",
            "--match-claims", "aud=myapp",
            "--headers", "X-Env=prod",
            "--headers", "X-Team=core",
        ]);
        let config = options.overlay(base).unwrap();
        assert_eq!(config.tags.len(), 1);
        assert_eq!(config.tags["title"], "My Page");
        assert_eq!(config.match_claims.len(), 1);
        assert_eq!(config.match_claims["aud"], "myapp");
        assert_eq!(config.headers.len(), 2);
        assert_eq!(config.headers["X-Env"], "prod");
        assert_eq!(config.headers["X-Team"], "core");
    }

    #[test]
    fn test_resources_appended() {
        let mut base = Config::default();
        base.resources.push("uri=/public|white-listed=true".parse().unwrap());

        let options = parse(&["--resource", "uri=/admin|methods=GET,POST|roles=admin"]);
        let config = options.overlay(base).unwrap();
        assert_eq!(config.resources.len(), 2);
        assert_eq!(config.resources[0].uri, "/public");
        assert_eq!(config.resources[1].uri, "/admin");
        assert_eq!(config.resources[1].methods, vec!["GET", "POST"]);
    }

    #[test]
    fn test_bad_resource_names_descriptor() {
        let options = parse(&["--resource", "uri=/admin|bogus"]);
        let err = options.overlay(Config::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Resource { ref descriptor, .. } if descriptor == "uri=/admin|bogus"
        ));
        assert!(err.to_string().starts_with("invalid resource uri=/admin|bogus,"));
    }

    #[test]
    fn test_bad_key_pair() {
        let options = parse(&["--match-claims", "aud"]);
        let err = options.overlay(Config::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::KeyPair { option: "match-claims", source: KeyPairError::Invalid(_) }
        ));
    }

    #[test]
    fn test_failure_applies_nothing() {
        let options = Options {
            listen: Some("0.0.0.0:80".into()),
            headers: Some(vec!["broken".into()]),
            ..Options::default()
        };
        assert!(options.overlay(Config::default()).is_err());

        // the same base with the good part alone is applied in full
        let options = Options { headers: None, ..options };
        let config = options.overlay(Config::default()).unwrap();
        assert_eq!(config.listen, "0.0.0.0:80");
    }
}
