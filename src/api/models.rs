//! Request and response bodies of the HTTP interface

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::observability::MetricsSnapshot;

/// Body of `POST /convert-document`
///
/// Both fields are optional at the wire level so that a missing field can be
/// reported as such instead of as a JSON syntax error. Serde maps an explicit
/// `null` to `None`, so `null` is reported as missing too.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConvertDocumentRequest {
    pub description_html: Option<String>,
    pub variant: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
    pub metrics: MetricsSnapshot,
}
