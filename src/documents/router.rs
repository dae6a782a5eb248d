use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::{DocumentType, UNDEFINED_DOCUMENT_TYPE, UpdateError, UpdatePayload};
use crate::content::QueryParams;

/// Persists a new description for one kind of page
#[async_trait]
pub trait DocumentUpdater: Send + Sync {
    async fn update(
        &self,
        params: &QueryParams,
        page_id: &str,
        description: Bytes,
        cookie: Option<&str>,
    ) -> Result<(), UpdateError>;
}

/// Routes description updates to the updater registered for their document type
#[derive(Clone, Default)]
pub struct UpdateRouter {
    updaters: HashMap<DocumentType, Arc<dyn DocumentUpdater>>,
}

impl UpdateRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_updater(
        mut self,
        document_type: DocumentType,
        updater: Arc<dyn DocumentUpdater>,
    ) -> Self {
        self.updaters.insert(document_type, updater);
        self
    }

    pub fn supports(&self, document_type: DocumentType) -> bool {
        self.updaters.contains_key(&document_type)
    }

    /// Dispatch to exactly one updater
    ///
    /// Absent, unknown, or unrouted document types fail with
    /// [`UpdateError::InvalidDocumentType`] before any updater runs. Errors from
    /// the chosen updater are returned as-is.
    pub async fn update_document(&self, payload: UpdatePayload) -> Result<(), UpdateError> {
        let UpdatePayload {
            cookie,
            document_type,
            page_id,
            params,
            updated_description,
        } = payload;

        let tag = document_type.as_deref().unwrap_or(UNDEFINED_DOCUMENT_TYPE);
        let updater = tag
            .parse::<DocumentType>()
            .ok()
            .and_then(|document_type| self.updaters.get(&document_type))
            .ok_or_else(|| {
                warn!(document_type = tag, %page_id, "Rejecting update for invalid document type");
                UpdateError::InvalidDocumentType(tag.to_string())
            })?;

        debug!(
            document_type = tag,
            %page_id,
            bytes = updated_description.len(),
            "Routing document update"
        );

        updater
            .update(&params, &page_id, updated_description, cookie.as_deref())
            .await
    }
}
