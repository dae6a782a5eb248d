use std::sync::Arc;

use crate::config::Config;
use crate::content::{ContentClient, ContentError};
use crate::convert::{DocumentConverter, HtmlConverter};
use crate::documents::UpdateRouter;
use crate::handlers::HandlerRegistry;
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<HandlerRegistry>,
    pub converter: Arc<dyn DocumentConverter>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: HandlerRegistry,
        converter: Arc<dyn DocumentConverter>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            converter,
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Production wiring: content client, default handlers, html5ever converter
    pub fn from_config(config: Config) -> Result<Self, ContentError> {
        let client = Arc::new(ContentClient::new(&config.content)?);
        let router = Arc::new(UpdateRouter::with_defaults(client.clone()));
        let registry = HandlerRegistry::with_defaults(client, router);

        Ok(Self::new(config, registry, Arc::new(HtmlConverter::new())))
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.config.server.api.max_payload_bytes.as_usize()
    }
}
