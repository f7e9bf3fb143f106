//! Configuration validation.
//!
//! # Responsibilities
//! - Cross-field checks serde cannot express (mode flags, TLS state,
//!   cookie security, token verification)
//! - Existence checks for TLS material on disk
//! - Normalize the redirection URL (trailing slash removed)
//!
//! # Design Decisions
//! - Checks run in a fixed order and the first failure is returned
//! - Runs exactly once per resolution, before the config is frozen

use std::path::Path;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::resource::ResourceError;
use crate::config::schema::Config;

/// A violated configuration invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("you have not specified the listening interface")]
    MissingListen,

    #[error("you have not provided a private key")]
    MissingPrivateKey,

    #[error("you have not provided a certificate file")]
    MissingCertificate,

    #[error("the tls certificate {0} does not exist")]
    CertificateNotFound(String),

    #[error("the tls private key {0} does not exist")]
    PrivateKeyNotFound(String),

    #[error("the tls ca certificate file {0} does not exist")]
    CaCertificateNotFound(String),

    #[error("the tls client certificate {0} does not exist")]
    ClientCertificateNotFound(String),

    #[error("you have not specified the client id")]
    MissingClientId,

    #[error("you have not specified the discovery url")]
    MissingDiscoveryUrl,

    #[error("no forwarding username")]
    MissingForwardingUsername,

    #[error("no forwarding password")]
    MissingForwardingPassword,

    #[error("you have not specified an upstream endpoint to proxy to")]
    MissingUpstream,

    #[error("the upstream endpoint is invalid, {0}")]
    InvalidUpstream(String),

    #[error("you have not specified a encryption key for encoding the session state")]
    MissingEncryptionKey,

    #[error("the encryption key ({0}) must be either 16 or 32 characters for AES-128/AES-256 selection")]
    InvalidEncryptionKeyLength(usize),

    #[error("the cookie is set to secure but your redirection url is non-tls")]
    InsecureRedirectionUrl,

    #[error("the store url is invalid, error: {0}")]
    InvalidStoreUrl(String),

    #[error("invalid resource: {0}")]
    InvalidResource(#[from] ResourceError),

    #[error("the claim matcher: {pattern} for claim: {claim} is not a valid regex")]
    InvalidClaimMatcher { claim: String, pattern: String },
}

/// Validate a configuration, returning it normalized on success.
pub fn validate(mut config: Config) -> Result<Config, ValidationError> {
    validate_config(&mut config)?;
    Ok(config)
}

/// Validate a configuration in place.
///
/// The only mutation is trimming a trailing `/` from the redirection URL.
pub fn validate_config(config: &mut Config) -> Result<(), ValidationError> {
    if config.listen.is_empty() {
        return Err(ValidationError::MissingListen);
    }

    validate_tls(config)?;

    if config.enable_forwarding {
        validate_forwarding(config)?;
    } else {
        validate_reverse_proxy(config)?;
    }

    for resource in &config.resources {
        resource.is_valid()?;
    }

    // sorted so the reported claim does not depend on map order
    let mut claims: Vec<_> = config.match_claims.iter().collect();
    claims.sort();
    for (claim, pattern) in claims {
        if Regex::new(pattern).is_err() {
            return Err(ValidationError::InvalidClaimMatcher {
                claim: claim.clone(),
                pattern: pattern.clone(),
            });
        }
    }

    Ok(())
}

fn validate_tls(config: &Config) -> Result<(), ValidationError> {
    if !config.tls_cert.is_empty() && config.tls_private_key.is_empty() {
        return Err(ValidationError::MissingPrivateKey);
    }
    if !config.tls_private_key.is_empty() && config.tls_cert.is_empty() {
        return Err(ValidationError::MissingCertificate);
    }

    let checks: [(&str, fn(String) -> ValidationError); 4] = [
        (config.tls_cert.as_str(), ValidationError::CertificateNotFound),
        (config.tls_private_key.as_str(), ValidationError::PrivateKeyNotFound),
        (config.tls_ca_certificate.as_str(), ValidationError::CaCertificateNotFound),
        (config.tls_client_certificate.as_str(), ValidationError::ClientCertificateNotFound),
    ];
    for (path, error) in checks {
        if !path.is_empty() && !Path::new(path).exists() {
            return Err(error(path.to_string()));
        }
    }

    Ok(())
}

fn validate_forwarding(config: &Config) -> Result<(), ValidationError> {
    if config.client_id.is_empty() {
        return Err(ValidationError::MissingClientId);
    }
    if config.discovery_url.is_empty() {
        return Err(ValidationError::MissingDiscoveryUrl);
    }
    if config.forwarding_username.is_empty() {
        return Err(ValidationError::MissingForwardingUsername);
    }
    if config.forwarding_password.is_empty() {
        return Err(ValidationError::MissingForwardingPassword);
    }
    Ok(())
}

fn validate_reverse_proxy(config: &mut Config) -> Result<(), ValidationError> {
    if config.upstream_url.is_empty() {
        return Err(ValidationError::MissingUpstream);
    }
    Url::parse(&config.upstream_url).map_err(|e| ValidationError::InvalidUpstream(e.to_string()))?;

    if config.skip_token_verification {
        return Ok(());
    }

    if config.client_id.is_empty() {
        return Err(ValidationError::MissingClientId);
    }
    if config.discovery_url.is_empty() {
        return Err(ValidationError::MissingDiscoveryUrl);
    }

    if let Some(trimmed) = config.redirection_url.strip_suffix('/') {
        config.redirection_url = trimmed.to_string();
    }

    if config.enable_refresh_tokens {
        if config.encryption_key.is_empty() {
            return Err(ValidationError::MissingEncryptionKey);
        }
        let length = config.encryption_key.len();
        if length != 16 && length != 32 {
            return Err(ValidationError::InvalidEncryptionKeyLength(length));
        }
    }

    if !config.no_redirects
        && config.secure_cookie
        && !config.redirection_url.starts_with("https")
    {
        return Err(ValidationError::InsecureRedirectionUrl);
    }

    if !config.store_url.is_empty() {
        Url::parse(&config.store_url).map_err(|e| ValidationError::InvalidStoreUrl(e.to_string()))?;
    }

    Ok(())
}
