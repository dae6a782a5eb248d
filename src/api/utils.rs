//! API utility functions
//!
//! Pure, stateless helpers for HTTP request processing, kept out of
//! services.rs so they can be unit tested.

use axum::http::{HeaderMap, header};

use crate::api::error::ApiError;

/// Parses a Content-Type header and checks it names `expected`
///
/// Parameters such as `charset` are ignored. Suffixes (`application/jsonp`,
/// `application/json-patch+json`) do not match.
pub fn parse_content_type(content_type: &str, expected: &mime::Mime) -> Result<mime::Mime, ApiError> {
    let media_type: mime::Mime = content_type.parse().map_err(|_| {
        ApiError::InvalidPayload(format!("invalid Content-Type: {}", content_type))
    })?;

    if media_type.type_() != expected.type_() || media_type.subtype() != expected.subtype() {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be {}, got: {}/{}",
            expected.essence_str(),
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// Validates the Content-Type header of a request, which must be present
pub fn require_content_type(headers: &HeaderMap, expected: &mime::Mime) -> Result<mime::Mime, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;

    parse_content_type(content_type, expected)
}

/// Raw `Cookie` header, forwarded verbatim to the content service
pub fn cookie_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
