use bon::Builder;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::content::{ContentError, EndpointError, QueryParams};
use crate::convert::CodecError;

/// Value rendered in errors when a request carries no document type
pub const UNDEFINED_DOCUMENT_TYPE: &str = "undefined";

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Update failed: Invalid document type {0} provided.")]
    InvalidDocumentType(String),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("invalid document state: {0}")]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Kind of page a document belongs to; selects the update pathway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    ProjectPage,
    WorkspacePage,
    TeamspacePage,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::ProjectPage,
        DocumentType::WorkspacePage,
        DocumentType::TeamspacePage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::ProjectPage => "project_page",
            DocumentType::WorkspacePage => "workspace_page",
            DocumentType::TeamspacePage => "teamspace_page",
        }
    }
}

impl FromStr for DocumentType {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UpdateError::InvalidDocumentType(s.to_string()))
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to replace a page's stored description
///
/// `document_type` is kept as the raw tag so unknown values can be reported
/// verbatim.
#[derive(Debug, Clone, Builder)]
pub struct UpdatePayload {
    #[builder(into)]
    pub cookie: Option<String>,
    #[builder(into)]
    pub document_type: Option<String>,
    #[builder(into)]
    pub page_id: String,
    #[builder(default)]
    pub params: QueryParams,
    #[builder(into)]
    pub updated_description: Bytes,
}
