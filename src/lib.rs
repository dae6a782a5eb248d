pub mod api;
pub mod config;
pub mod content;
pub mod convert;
pub mod documents;
pub mod handlers;
pub mod humanize;
pub mod observability;
