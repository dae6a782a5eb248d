use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::content::{ContentError, EndpointError, QueryParams};
use crate::convert::CodecError;
use crate::documents::UpdateError;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Update(#[from] UpdateError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("invalid document state: {0}")]
    Codec(#[from] CodecError),
}

/// Loads and persists the binary state of one family of documents
#[async_trait]
pub trait DocumentHandler: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Current binary state, `None` when the page has none yet
    async fn fetch(
        &self,
        page_id: &str,
        params: &QueryParams,
        cookie: Option<&str>,
    ) -> Result<Option<Bytes>, HandlerError>;

    async fn store(
        &self,
        page_id: &str,
        state: Bytes,
        params: &QueryParams,
        cookie: Option<&str>,
    ) -> Result<(), HandlerError>;
}
