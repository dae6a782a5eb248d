use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::traits::DocumentHandler;
use crate::content::QueryParams;
use crate::content::endpoints::WORKSPACE_SLUG;
use crate::documents::DocumentType;

pub const DOCUMENT_TYPE_PARAM: &str = "documentType";

/// Per-request facts a selector can inspect
///
/// Built fresh for every dispatch and dropped afterwards. `document_type` is
/// the raw tag from the request so selectors can match values the closed
/// [`DocumentType`] enum does not know about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerContext {
    pub document_type: Option<String>,
    pub workspace_slug: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl HandlerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    pub fn with_workspace_slug(mut self, slug: impl Into<String>) -> Self {
        self.workspace_slug = Some(slug.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Context for a document request; first value wins for repeated keys
    pub fn from_params(params: &QueryParams) -> Self {
        let mut ctx = Self {
            document_type: params.get_non_empty(DOCUMENT_TYPE_PARAM).map(str::to_owned),
            workspace_slug: params.get_non_empty(WORKSPACE_SLUG).map(str::to_owned),
            fields: BTreeMap::new(),
        };

        for (key, value) in params.iter() {
            if key == DOCUMENT_TYPE_PARAM || key == WORKSPACE_SLUG {
                continue;
            }
            ctx.fields
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }

        ctx
    }

    /// Parsed document type, `None` when absent or unrecognized
    pub fn parsed_document_type(&self) -> Option<DocumentType> {
        self.document_type.as_deref()?.parse().ok()
    }

    pub fn is_document_type(&self, document_type: DocumentType) -> bool {
        self.document_type.as_deref() == Some(document_type.as_str())
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

pub type Selector = Arc<dyn Fn(&HandlerContext) -> bool + Send + Sync>;

/// One registry entry: when `selector` matches, `handler` serves the request
#[derive(Clone)]
pub struct HandlerDefinition {
    pub selector: Selector,
    pub handler: Arc<dyn DocumentHandler>,
    pub priority: i32,
}

impl HandlerDefinition {
    pub fn new(
        selector: impl Fn(&HandlerContext) -> bool + Send + Sync + 'static,
        handler: Arc<dyn DocumentHandler>,
        priority: i32,
    ) -> Self {
        Self {
            selector: Arc::new(selector),
            handler,
            priority,
        }
    }

    pub fn matches(&self, ctx: &HandlerContext) -> bool {
        (self.selector)(ctx)
    }
}

impl fmt::Debug for HandlerDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDefinition")
            .field("handler", &self.handler.name())
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}
