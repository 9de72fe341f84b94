use super::models::Config;
use crate::recipe::validate_filename;
use reqwest::Url;
use thiserror::Error;

/// Mount point of the listing API, never shared with the protocol routes
pub const LISTING_ROOT: &str = "/corum";

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("remote_prefix '{value}' must be empty or start with '/' and not end with '/'")]
    InvalidRemotePrefix { value: String },

    #[error("remote_prefix '{value}' contains route syntax or whitespace")]
    RemotePrefixSyntax { value: String },

    #[error("remote_prefix '{value}' collides with the listing API at {}", LISTING_ROOT)]
    ReservedRemotePrefix { value: String },

    #[error("{field} '{value}' is not an absolute http(s) URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("Content store tag '{value}' is not a single path segment")]
    InvalidTag { value: String },

    #[error("Timeout must be positive: {field}")]
    ZeroTimeout { field: &'static str },

    #[error("max_document_bytes must be positive")]
    InvalidDocumentLimit,

    #[error("Index pool needs at least one connection")]
    NoIndexConnections,

    #[error("Index URL '{value}' is not a sqlite: URL")]
    InvalidIndexUrl { value: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_content_store(config)?;
    validate_index(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    let prefix = &config.server.remote_prefix;
    if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
        return Err(ValidationError::InvalidRemotePrefix {
            value: prefix.clone(),
        });
    }
    if prefix
        .chars()
        .any(|c| matches!(c, '{' | '}' | '*' | '?' | '#') || c.is_whitespace())
    {
        return Err(ValidationError::RemotePrefixSyntax {
            value: prefix.clone(),
        });
    }
    let reserved = prefix
        .strip_prefix(LISTING_ROOT)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    if reserved {
        return Err(ValidationError::ReservedRemotePrefix {
            value: prefix.clone(),
        });
    }

    if let Some(public_url) = &config.server.public_url {
        validate_http_url("public_url", public_url)?;
    }

    Ok(())
}

fn validate_content_store(config: &Config) -> Result<(), ValidationError> {
    let store = &config.content_store;
    validate_http_url("base_url", &store.base_url)?;

    if validate_filename(&store.tag).is_err() {
        return Err(ValidationError::InvalidTag {
            value: store.tag.clone(),
        });
    }

    if store.connect_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "connect_timeout_secs",
        });
    }
    if store.request_timeout_secs == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "request_timeout_secs",
        });
    }

    if store.max_document_bytes.as_u64() == 0 {
        return Err(ValidationError::InvalidDocumentLimit);
    }

    Ok(())
}

fn validate_index(config: &Config) -> Result<(), ValidationError> {
    if config.index.max_connections == 0 {
        return Err(ValidationError::NoIndexConnections);
    }
    if !config.index.url.starts_with("sqlite:") {
        return Err(ValidationError::InvalidIndexUrl {
            value: config.index.url.clone(),
        });
    }
    Ok(())
}

fn validate_http_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::humanize::ByteSize;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_remote_prefix_shape() {
        let mut config = Config::default();
        config.server.remote_prefix = "github".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidRemotePrefix { .. })
        ));

        config.server.remote_prefix = "/github/".to_string();
        assert!(validate(&config).is_err());

        config.server.remote_prefix = String::new();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_remote_prefix_cannot_shadow_listing_api() {
        let mut config = Config::default();
        for prefix in ["/corum", "/corum/conan"] {
            config.server.remote_prefix = prefix.to_string();
            assert!(matches!(
                validate(&config),
                Err(ValidationError::ReservedRemotePrefix { .. })
            ));
        }

        config.server.remote_prefix = "/corumx".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_remote_prefix_rejects_route_syntax() {
        let mut config = Config::default();
        for prefix in ["/{remote}", "/git*", "/git hub", "/a?b"] {
            config.server.remote_prefix = prefix.to_string();
            assert!(
                matches!(
                    validate(&config),
                    Err(ValidationError::RemotePrefixSyntax { .. })
                ),
                "{}",
                prefix
            );
        }
    }

    #[test]
    fn test_public_url_must_be_http() {
        let mut config = Config::default();
        config.server.public_url = Some("ftp://mirror".to_string());
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidUrl {
                field: "public_url",
                ..
            })
        ));

        config.server.public_url = Some("https://recipes.example.com".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_tag_must_be_one_segment() {
        let mut config = Config::default();
        config.content_store.tag = "a/b".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidTag { .. })
        ));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = Config::default();
        config.content_store.request_timeout_secs = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroTimeout {
                field: "request_timeout_secs"
            })
        ));

        let mut config = Config::default();
        config.content_store.max_document_bytes = ByteSize(0);
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidDocumentLimit)
        ));

        let mut config = Config::default();
        config.index.max_connections = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::NoIndexConnections)
        ));
    }

    #[test]
    fn test_index_url_scheme() {
        let mut config = Config::default();
        config.index.url = "postgres://localhost/recipes".to_string();
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidIndexUrl { .. })
        ));
    }
}
