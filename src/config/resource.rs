//! Protected resource descriptors.
//!
//! # Descriptor Syntax
//! ```text
//! uri=/admin/*|methods=GET,POST|roles=admin,ops|white-listed=false
//! ```
//!
//! # Design Decisions
//! - `methods` and `roles` are optional; empty means any method / any
//!   authenticated user
//! - Whitespace around `|` and `=` is ignored
//! - Methods are normalized to upper case at parse time

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP methods a resource may restrict access to.
pub const HTTP_METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "CONNECT", "TRACE",
];

/// Errors raised while parsing or checking a resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("the resource has no options")]
    Empty,

    #[error("invalid resource keypair '{0}', should be (uri|roles|methods|white-listed)=comma_values")]
    InvalidKeyPair(String),

    #[error("invalid identifier '{0}', should be uri, methods, roles or white-listed")]
    UnknownKey(String),

    #[error("invalid white-listed value '{0}', should be true or false")]
    InvalidWhiteListed(String),

    #[error("resource does not have a uri")]
    MissingUri,

    #[error("invalid method {method} for resource {uri}")]
    InvalidMethod { uri: String, method: String },
}

/// An access-control rule for a URI pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Resource {
    /// URI pattern, may contain wildcard segments.
    pub uri: String,

    /// Allowed HTTP methods; empty allows every method.
    pub methods: Vec<String>,

    /// Required roles; empty means authenticated only.
    pub roles: Vec<String>,

    /// Skip authentication entirely for this URI.
    pub white_listed: bool,
}

impl Resource {
    /// Check the resource's own validity contract.
    pub fn is_valid(&self) -> Result<(), ResourceError> {
        if self.uri.is_empty() {
            return Err(ResourceError::MissingUri);
        }

        if let Some(method) = self
            .methods
            .iter()
            .find(|m| !HTTP_METHODS.contains(&m.as_str()))
        {
            return Err(ResourceError::InvalidMethod {
                uri: self.uri.clone(),
                method: method.clone(),
            });
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

impl FromStr for Resource {
    type Err = ResourceError;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        if descriptor.trim().is_empty() {
            return Err(ResourceError::Empty);
        }

        let mut resource = Resource::default();

        for segment in descriptor.split('|') {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| ResourceError::InvalidKeyPair(segment.trim().to_string()))?;
            let value = value.trim();

            match key.trim() {
                "uri" => resource.uri = value.to_string(),
                "methods" => {
                    let methods: Vec<String> =
                        split_list(value).iter().map(|m| m.to_uppercase()).collect();
                    // a lone "any" is the same as leaving methods out
                    resource.methods = if methods == ["ANY"] { Vec::new() } else { methods };
                }
                "roles" => resource.roles = split_list(value),
                "white-listed" => {
                    resource.white_listed = value
                        .parse()
                        .map_err(|_| ResourceError::InvalidWhiteListed(value.to_string()))?;
                }
                other => return Err(ResourceError::UnknownKey(other.to_string())),
            }
        }

        Ok(resource)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods = if self.methods.is_empty() {
            "ANY".to_string()
        } else {
            self.methods.join(",")
        };
        let roles = if self.roles.is_empty() {
            "authenticated".to_string()
        } else {
            self.roles.join(",")
        };

        write!(f, "uri: {}, methods: {}, roles: {}", self.uri, methods, roles)?;
        if self.white_listed {
            write!(f, " (white-listed)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_descriptor() {
        let resource: Resource = "uri=/admin|methods=GET,POST|roles=admin".parse().unwrap();
        assert_eq!(resource.uri, "/admin");
        assert_eq!(resource.methods, vec!["GET", "POST"]);
        assert_eq!(resource.roles, vec!["admin"]);
        assert!(!resource.white_listed);
        assert!(resource.is_valid().is_ok());
    }

    #[test]
    fn test_parse_ignores_whitespace() {
        let resource: Resource = " uri = /api/* | methods = get , put | roles = a,b "
            .parse()
            .unwrap();
        assert_eq!(resource.uri, "/api/*");
        assert_eq!(resource.methods, vec!["GET", "PUT"]);
        assert_eq!(resource.roles, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_uri_only() {
        let resource: Resource = "uri=/".parse().unwrap();
        assert_eq!(resource.uri, "/");
        assert!(resource.methods.is_empty());
        assert!(resource.roles.is_empty());
    }

    #[test]
    fn test_parse_any_method() {
        let resource: Resource = "uri=/|methods=any".parse().unwrap();
        assert!(resource.methods.is_empty());
    }

    #[test]
    fn test_parse_white_listed() {
        let resource: Resource = "uri=/public|white-listed=true".parse().unwrap();
        assert!(resource.white_listed);

        let err = "uri=/public|white-listed=maybe".parse::<Resource>().unwrap_err();
        assert_eq!(err, ResourceError::InvalidWhiteListed("maybe".into()));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Resource>().unwrap_err(), ResourceError::Empty);
        assert_eq!(
            "uri=/|roles".parse::<Resource>().unwrap_err(),
            ResourceError::InvalidKeyPair("roles".into())
        );
        assert_eq!(
            "uri=/|colour=red".parse::<Resource>().unwrap_err(),
            ResourceError::UnknownKey("colour".into())
        );
    }

    #[test]
    fn test_is_valid() {
        let resource = Resource::default();
        assert_eq!(resource.is_valid().unwrap_err(), ResourceError::MissingUri);

        let resource: Resource = "uri=/x|methods=FETCH".parse().unwrap();
        assert!(matches!(
            resource.is_valid(),
            Err(ResourceError::InvalidMethod { ref method, .. }) if method == "FETCH"
        ));
    }

    #[test]
    fn test_display() {
        let resource: Resource = "uri=/admin|roles=admin".parse().unwrap();
        assert_eq!(resource.to_string(), "uri: /admin, methods: ANY, roles: admin");
    }
}
