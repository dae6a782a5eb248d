//! Document handler selection
//!
//! A handler loads and persists the binary state of one family of pages.
//! Handlers are registered once at startup with a selector and a priority;
//! each request builds a [`HandlerContext`] and the sealed [`HandlerRegistry`]
//! returns the highest-priority handler whose selector accepts it.
//!
//! ## Key Components
//!
//! - [`DocumentHandler`] - fetch/store trait implemented by handlers
//! - [`HandlerRegistryBuilder`] - startup-time registration
//! - [`HandlerRegistry`] - immutable lookup shared by request handlers
//! - [`ProjectPageHandler`] / [`RoutedPageHandler`] - built-in handlers
//!
//! ## Example
//!
//! ```rust,ignore
//! use livedoc::handlers::{HandlerContext, HandlerRegistry};
//!
//! let registry = HandlerRegistry::with_defaults(client, router);
//! let ctx = HandlerContext::from_params(&params);
//! let handler = registry.get_handler(&ctx)?;
//! let state = handler.fetch(page_id, &params, cookie).await?;
//! ```

mod pages;
mod registry;
mod traits;
mod types;

pub use pages::{ProjectPageHandler, RoutedPageHandler};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder, RegistryError};
pub use traits::{DocumentHandler, HandlerError};
pub use types::{DOCUMENT_TYPE_PARAM, HandlerContext, HandlerDefinition, Selector};
