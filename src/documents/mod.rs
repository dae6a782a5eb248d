//! Document update routing
//!
//! An update request names its document type with a string tag. The
//! [`UpdateRouter`] maps each [`DocumentType`] to the [`DocumentUpdater`] that
//! knows where that kind of page lives; any other tag is rejected before a
//! request leaves the service.
//!
//! ## Example
//!
//! ```rust,ignore
//! use livedoc::documents::{UpdatePayload, UpdateRouter};
//!
//! let router = UpdateRouter::with_defaults(client);
//! router
//!     .update_document(
//!         UpdatePayload::builder()
//!             .document_type("workspace_page")
//!             .page_id("p1")
//!             .params(params)
//!             .updated_description(state)
//!             .build(),
//!     )
//!     .await?;
//! ```

mod router;
mod types;
mod updaters;

pub use router::{DocumentUpdater, UpdateRouter};
pub use types::{DocumentType, UNDEFINED_DOCUMENT_TYPE, UpdateError, UpdatePayload};
pub use updaters::{TeamspacePageUpdater, WorkspacePageUpdater, description_update};

#[cfg(test)]
pub(crate) use router::tests::RecordingUpdater;

use std::sync::Arc;

use crate::content::ContentClient;

impl UpdateRouter {
    /// Router with the built-in workspace and teamspace updaters
    pub fn with_defaults(client: Arc<ContentClient>) -> Self {
        Self::new()
            .with_updater(
                DocumentType::WorkspacePage,
                Arc::new(WorkspacePageUpdater::new(client.clone())),
            )
            .with_updater(
                DocumentType::TeamspacePage,
                Arc::new(TeamspacePageUpdater::new(client)),
            )
    }
}
