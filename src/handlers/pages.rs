use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info};

use super::traits::{DocumentHandler, HandlerError};
use super::types::DOCUMENT_TYPE_PARAM;
use crate::content::{ContentClient, QueryParams, endpoints};
use crate::documents::{
    DocumentType, UNDEFINED_DOCUMENT_TYPE, UpdateError, UpdatePayload, UpdateRouter,
    description_update,
};

/// Project pages read and write the project description endpoint directly
pub struct ProjectPageHandler {
    client: Arc<ContentClient>,
}

impl ProjectPageHandler {
    pub const PRIORITY: i32 = 0;

    pub fn new(client: Arc<ContentClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentHandler for ProjectPageHandler {
    fn name(&self) -> &str {
        "project_page"
    }

    async fn fetch(
        &self,
        page_id: &str,
        params: &QueryParams,
        cookie: Option<&str>,
    ) -> Result<Option<Bytes>, HandlerError> {
        let path = endpoints::project_page(params, page_id)?;
        Ok(self.client.fetch_description(&path, cookie).await?)
    }

    async fn store(
        &self,
        page_id: &str,
        state: Bytes,
        params: &QueryParams,
        cookie: Option<&str>,
    ) -> Result<(), HandlerError> {
        let path = endpoints::project_page(params, page_id)?;
        let body = description_update(&state)?;
        self.client.patch_description(&path, &body, cookie).await?;
        info!(page_id, "Project page description updated");
        Ok(())
    }
}

/// Workspace and teamspace pages; stores go through the [`UpdateRouter`]
pub struct RoutedPageHandler {
    client: Arc<ContentClient>,
    router: Arc<UpdateRouter>,
}

impl RoutedPageHandler {
    pub const PRIORITY: i32 = 10;

    pub fn new(client: Arc<ContentClient>, router: Arc<UpdateRouter>) -> Self {
        Self { client, router }
    }
}

#[async_trait]
impl DocumentHandler for RoutedPageHandler {
    fn name(&self) -> &str {
        "routed_page"
    }

    async fn fetch(
        &self,
        page_id: &str,
        params: &QueryParams,
        cookie: Option<&str>,
    ) -> Result<Option<Bytes>, HandlerError> {
        let tag = params.get_non_empty(DOCUMENT_TYPE_PARAM);
        let path = match tag.and_then(|t| t.parse::<DocumentType>().ok()) {
            Some(DocumentType::WorkspacePage) => endpoints::workspace_page(params, page_id)?,
            Some(DocumentType::TeamspacePage) => endpoints::teamspace_page(params, page_id)?,
            _ => {
                let tag = tag.unwrap_or(UNDEFINED_DOCUMENT_TYPE);
                return Err(UpdateError::InvalidDocumentType(tag.to_string()).into());
            }
        };

        debug!(page_id, %path, "Fetching routed page description");
        Ok(self.client.fetch_description(&path, cookie).await?)
    }

    async fn store(
        &self,
        page_id: &str,
        state: Bytes,
        params: &QueryParams,
        cookie: Option<&str>,
    ) -> Result<(), HandlerError> {
        let payload = UpdatePayload::builder()
            .maybe_cookie(cookie)
            .maybe_document_type(params.get_non_empty(DOCUMENT_TYPE_PARAM))
            .page_id(page_id)
            .params(params.clone())
            .updated_description(state)
            .build();

        Ok(self.router.update_document(payload).await?)
    }
}
