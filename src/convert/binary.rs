//! Binary document state.
//!
//! The node tree is stored as a protobuf message so the content service can
//! keep an opaque, compact blob next to the HTML and JSON forms.

use prost::Message;
use thiserror::Error;

use super::DocumentVariant;
use super::node::{Attrs, Mark, Node};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("binary document is not a valid state message: {0}")]
    Decode(#[from] prost::DecodeError),
    #[error("unsupported document schema version {0}")]
    UnsupportedVersion(u32),
    #[error("binary document has no root node")]
    MissingRoot,
    #[error("attribute '{key}' holds invalid JSON: {source}")]
    InvalidAttr {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize decoded document: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Clone, PartialEq, Message)]
pub struct DocumentState {
    #[prost(uint32, tag = "1")]
    pub schema_version: u32,
    #[prost(string, tag = "2")]
    pub variant: String,
    #[prost(message, optional, tag = "3")]
    pub root: Option<NodeState>,
}

#[derive(Clone, PartialEq, Message)]
pub struct NodeState {
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(message, repeated, tag = "2")]
    pub attrs: Vec<AttrState>,
    #[prost(message, repeated, tag = "3")]
    pub children: Vec<NodeState>,
    #[prost(string, optional, tag = "4")]
    pub text: Option<String>,
    #[prost(message, repeated, tag = "5")]
    pub marks: Vec<MarkState>,
}

#[derive(Clone, PartialEq, Message)]
pub struct AttrState {
    #[prost(string, tag = "1")]
    pub key: String,
    /// JSON-encoded attribute value
    #[prost(string, tag = "2")]
    pub value: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct MarkState {
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(message, repeated, tag = "2")]
    pub attrs: Vec<AttrState>,
}

/// A decoded binary document
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDocument {
    /// Variant recorded at encode time; `None` when the tag is unknown
    pub variant: Option<DocumentVariant>,
    pub root: Node,
}

pub fn encode(root: &Node, variant: DocumentVariant) -> Vec<u8> {
    DocumentState {
        schema_version: SCHEMA_VERSION,
        variant: variant.as_str().to_string(),
        root: Some(node_to_state(root)),
    }
    .encode_to_vec()
}

pub fn decode(bytes: &[u8]) -> Result<DecodedDocument, CodecError> {
    let state = DocumentState::decode(bytes)?;

    if state.schema_version != SCHEMA_VERSION {
        return Err(CodecError::UnsupportedVersion(state.schema_version));
    }

    let root = state.root.ok_or(CodecError::MissingRoot)?;

    Ok(DecodedDocument {
        variant: state.variant.parse().ok(),
        root: state_to_node(root)?,
    })
}

fn attrs_to_state(attrs: &Attrs) -> Vec<AttrState> {
    attrs
        .iter()
        .map(|(key, value)| AttrState {
            key: key.clone(),
            value: value.to_string(),
        })
        .collect()
}

fn state_to_attrs(attrs: Vec<AttrState>) -> Result<Attrs, CodecError> {
    attrs
        .into_iter()
        .map(|attr| -> Result<(String, serde_json::Value), CodecError> {
            let value = serde_json::from_str(&attr.value).map_err(|source| {
                CodecError::InvalidAttr {
                    key: attr.key.clone(),
                    source,
                }
            })?;
            Ok((attr.key, value))
        })
        .collect()
}

fn node_to_state(node: &Node) -> NodeState {
    NodeState {
        kind: node.kind.clone(),
        attrs: attrs_to_state(&node.attrs),
        children: node.content.iter().map(node_to_state).collect(),
        text: node.text.clone(),
        marks: node
            .marks
            .iter()
            .map(|mark| MarkState {
                kind: mark.kind.clone(),
                attrs: attrs_to_state(&mark.attrs),
            })
            .collect(),
    }
}

fn state_to_node(state: NodeState) -> Result<Node, CodecError> {
    let marks = state
        .marks
        .into_iter()
        .map(|mark| -> Result<Mark, CodecError> {
            Ok(Mark {
                kind: mark.kind,
                attrs: state_to_attrs(mark.attrs)?,
            })
        })
        .collect::<Result<Vec<_>, CodecError>>()?;

    let content = state
        .children
        .into_iter()
        .map(state_to_node)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Node {
        kind: state.kind,
        attrs: state_to_attrs(state.attrs)?,
        content,
        text: state.text,
        marks,
    })
}
