//! Content service collaborator
//!
//! The content service is the product's REST API that owns page
//! descriptions. This module holds the HTTP client, the endpoint paths and
//! the query parameter bag the paths are built from.

mod client;
pub mod endpoints;
mod params;

pub use client::{ContentClient, ContentError, DescriptionUpdate};
pub use endpoints::{EndpointError, EndpointPath};
pub use params::QueryParams;
