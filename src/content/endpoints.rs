//! Description endpoints of the content service.
//!
//! Identifiers other than the page id come from the request's query
//! parameters, which the editor client sets when it opens a document. Paths
//! are kept as raw segments; the client percent-encodes each one when it
//! builds the request URL, so an identifier can never add path components.

use std::fmt;
use thiserror::Error;

use super::params::QueryParams;

pub const WORKSPACE_SLUG: &str = "workspaceSlug";
pub const PROJECT_ID: &str = "projectId";
pub const TEAMSPACE_ID: &str = "teamspaceId";
pub const PAGE_ID: &str = "page id";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("missing required query parameter '{0}'")]
    MissingParam(&'static str),
    #[error("invalid {name} '{value}'")]
    InvalidSegment { name: &'static str, value: String },
}

/// Path below the content service base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPath {
    segments: Vec<String>,
}

impl EndpointPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Unencoded segments; an empty last segment is a trailing slash
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
}

impl fmt::Display for EndpointPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Dot segments would be resolved away by URL normalization
fn segment<'a>(name: &'static str, value: &'a str) -> Result<&'a str, EndpointError> {
    match value {
        "" | "." | ".." => Err(EndpointError::InvalidSegment {
            name,
            value: value.to_string(),
        }),
        _ => Ok(value),
    }
}

fn require<'a>(params: &'a QueryParams, key: &'static str) -> Result<&'a str, EndpointError> {
    let value = params
        .get_non_empty(key)
        .ok_or(EndpointError::MissingParam(key))?;
    segment(key, value)
}

pub fn project_page(params: &QueryParams, page_id: &str) -> Result<EndpointPath, EndpointError> {
    let slug = require(params, WORKSPACE_SLUG)?;
    let project_id = require(params, PROJECT_ID)?;
    let page_id = segment(PAGE_ID, page_id)?;
    Ok(EndpointPath::new([
        "api", "workspaces", slug, "projects", project_id, "pages", page_id, "description", "",
    ]))
}

pub fn workspace_page(params: &QueryParams, page_id: &str) -> Result<EndpointPath, EndpointError> {
    let slug = require(params, WORKSPACE_SLUG)?;
    let page_id = segment(PAGE_ID, page_id)?;
    Ok(EndpointPath::new([
        "api", "workspaces", slug, "pages", page_id, "description", "",
    ]))
}

pub fn teamspace_page(params: &QueryParams, page_id: &str) -> Result<EndpointPath, EndpointError> {
    let slug = require(params, WORKSPACE_SLUG)?;
    let teamspace_id = require(params, TEAMSPACE_ID)?;
    let page_id = segment(PAGE_ID, page_id)?;
    Ok(EndpointPath::new([
        "api", "workspaces", slug, "teamspaces", teamspace_id, "pages", page_id, "description", "",
    ]))
}
