use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::pages::{ProjectPageHandler, RoutedPageHandler};
use super::traits::DocumentHandler;
use super::types::{HandlerContext, HandlerDefinition};
use crate::content::ContentClient;
use crate::documents::{DocumentType, UNDEFINED_DOCUMENT_TYPE, UpdateRouter};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no handler registered for document type {document_type}")]
    NoHandler { document_type: String },
}

/// Collects handler definitions at startup
#[derive(Debug, Default)]
pub struct HandlerRegistryBuilder {
    definitions: Vec<HandlerDefinition>,
}

impl HandlerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition, keeping the list ordered by descending priority
    ///
    /// Equal priorities keep registration order.
    pub fn register(&mut self, definition: HandlerDefinition) -> &mut Self {
        self.definitions.push(definition);
        self.definitions.sort_by(|a, b| b.priority.cmp(&a.priority));
        self
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            definitions: self.definitions.into(),
        }
    }
}

/// Sealed, priority-ordered set of document handlers
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    definitions: Arc<[HandlerDefinition]>,
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::new()
    }

    /// First handler, in priority order, whose selector accepts `ctx`
    pub fn get_handler(
        &self,
        ctx: &HandlerContext,
    ) -> Result<Arc<dyn DocumentHandler>, RegistryError> {
        let definition = self
            .definitions
            .iter()
            .find(|definition| definition.matches(ctx))
            .ok_or_else(|| RegistryError::NoHandler {
                document_type: ctx
                    .document_type
                    .clone()
                    .unwrap_or_else(|| UNDEFINED_DOCUMENT_TYPE.to_string()),
            })?;

        debug!(
            handler = definition.handler.name(),
            priority = definition.priority,
            "Handler selected"
        );
        Ok(definition.handler.clone())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registry with the built-in project and routed page handlers
    pub fn with_defaults(client: Arc<ContentClient>, router: Arc<UpdateRouter>) -> Self {
        let mut builder = Self::builder();

        builder
            .register(HandlerDefinition::new(
                |ctx: &HandlerContext| ctx.is_document_type(DocumentType::ProjectPage),
                Arc::new(ProjectPageHandler::new(client.clone())),
                ProjectPageHandler::PRIORITY,
            ))
            .register(HandlerDefinition::new(
                |ctx: &HandlerContext| {
                    ctx.is_document_type(DocumentType::WorkspacePage)
                        || ctx.is_document_type(DocumentType::TeamspacePage)
                },
                Arc::new(RoutedPageHandler::new(client, router)),
                RoutedPageHandler::PRIORITY,
            ));

        builder.build()
    }
}
