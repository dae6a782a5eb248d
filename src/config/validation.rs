use super::models::Config;
use crate::humanize::ByteSize;
use reqwest::Url;
use thiserror::Error;

/// Hard ceiling for `server.api.max_payload_bytes`
pub const MAX_PAYLOAD_LIMIT: ByteSize = ByteSize::mib(32);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("content.base_url '{url}' is not a valid http(s) URL")]
    InvalidBaseUrl { url: String },

    #[error("Timeout must be positive: {field} = 0")]
    ZeroTimeout { field: &'static str },

    #[error("max_payload_bytes must be positive")]
    ZeroPayloadLimit,

    #[error("max_payload_bytes ({actual}) exceeds limit of {limit}")]
    PayloadLimitExceeded { actual: ByteSize, limit: ByteSize },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_content(config)?;
    validate_payload_limit(config)?;
    Ok(())
}

fn validate_content(config: &Config) -> Result<(), ValidationError> {
    let content = &config.content;

    let valid_url = Url::parse(&content.base_url)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !valid_url {
        return Err(ValidationError::InvalidBaseUrl {
            url: content.base_url.clone(),
        });
    }

    if content.connect_timeout_ms == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "content.connect_timeout_ms",
        });
    }
    if content.request_timeout_ms == 0 {
        return Err(ValidationError::ZeroTimeout {
            field: "content.request_timeout_ms",
        });
    }

    Ok(())
}

fn validate_payload_limit(config: &Config) -> Result<(), ValidationError> {
    let actual = config.server.api.max_payload_bytes;

    if actual.as_u64() == 0 {
        return Err(ValidationError::ZeroPayloadLimit);
    }
    if actual > MAX_PAYLOAD_LIMIT {
        return Err(ValidationError::PayloadLimitExceeded {
            actual,
            limit: MAX_PAYLOAD_LIMIT,
        });
    }

    Ok(())
}
