//! Encoding and decoding utilities for cosmlink.
//!
//! This crate owns the message registry that maps protobuf type URLs to
//! their binary and amino JSON codecs, the canonical JSON writer used for
//! legacy amino sign bytes, and the base Cosmos SDK message set.

pub mod json;
pub mod msgs;
pub mod protobuf;
pub mod registry;

use thiserror::Error;

pub use json::canonical_json;
pub use msgs::default_registry;
pub use protobuf::{Any, MessageExt};
pub use registry::{
    AminoConvert, AminoMsg, Msg, Registry, RegistryBuilder, RegistryEntry, TypedMessage,
};

/// Codec errors
#[derive(Error, Debug)]
pub enum CodecError {
    /// No entry registered for the type URL
    #[error("unregistered type url: {0}")]
    UnknownTypeUrl(String),

    /// No entry registered for the amino type
    #[error("unregistered amino type: {0}")]
    UnknownAminoType(String),

    /// The message is not the Rust type registered for the type URL
    #[error("message type mismatch: expected {expected}")]
    TypeMismatch { expected: String },

    #[error("failed to encode protobuf: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("failed to decode protobuf: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Malformed amino JSON
    #[error("invalid amino json: {0}")]
    Amino(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
