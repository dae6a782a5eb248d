//! HTML document conversion
//!
//! Turns a page body submitted as HTML into the forms the content service
//! persists: the editor JSON tree (`description`) and the binary document
//! state (`description_binary`, base64 in JSON payloads).
//!
//! ## Key Components
//!
//! - [`DocumentConverter`] - conversion seam used by the HTTP layer
//! - [`HtmlConverter`] - built-in converter backed by html5ever
//! - [`DocumentVariant`] - selects the editor schema (`rich` or `document`)
//! - [`binary`] - protobuf encoding of the node tree

pub mod binary;
pub mod html;
pub mod node;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use binary::{CodecError, DecodedDocument};
pub use node::{Mark, Node};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("unsupported document variant: {0}")]
    UnsupportedVariant(String),
    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Editor schema the document is converted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentVariant {
    /// Rich text fields (issue descriptions, comments): no tables or task lists
    Rich,
    /// Full page editor
    Document,
}

impl DocumentVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentVariant::Rich => "rich",
            DocumentVariant::Document => "document",
        }
    }

    pub fn supports_tables(&self) -> bool {
        matches!(self, DocumentVariant::Document)
    }

    pub fn supports_tasks(&self) -> bool {
        matches!(self, DocumentVariant::Document)
    }
}

impl FromStr for DocumentVariant {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rich" => Ok(DocumentVariant::Rich),
            "document" => Ok(DocumentVariant::Document),
            other => Err(ConvertError::UnsupportedVariant(other.to_string())),
        }
    }
}

impl fmt::Display for DocumentVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a conversion; serializes to the `/convert-document` response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedDocument {
    pub description: serde_json::Value,
    #[serde(serialize_with = "serialize_base64")]
    pub description_binary: Vec<u8>,
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&STANDARD.encode(bytes))
}

/// Converts an HTML body into every stored representation
pub trait DocumentConverter: Send + Sync {
    fn convert(&self, html: &str, variant: &str) -> Result<ConvertedDocument, ConvertError>;
}

/// Default converter: html5ever parse, JSON tree, protobuf state
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlConverter;

impl HtmlConverter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentConverter for HtmlConverter {
    fn convert(&self, html: &str, variant: &str) -> Result<ConvertedDocument, ConvertError> {
        let variant: DocumentVariant = variant.parse()?;
        let root = html::parse_html(html, variant);

        Ok(ConvertedDocument {
            description: serde_json::to_value(&root)?,
            description_binary: binary::encode(&root, variant),
        })
    }
}

/// All forms derived from a stored binary state
#[derive(Debug, Clone)]
pub struct DescriptionForms {
    pub description_html: String,
    pub description: serde_json::Value,
}

/// Derive HTML and JSON from a binary document state
pub fn forms_from_binary(bytes: &[u8]) -> Result<DescriptionForms, CodecError> {
    let decoded = binary::decode(bytes)?;
    let description = serde_json::to_value(&decoded.root).map_err(CodecError::Serialize)?;

    Ok(DescriptionForms {
        description_html: html::render_html(&decoded.root),
        description,
    })
}

/// Base64 helper for JSON payloads carrying binary state
pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
