//! Protobuf `Any` and type URL support

use crate::{CodecError, Result};
use prost::Message;

/// Cosmos SDK Any type
///
/// Polymorphic wrapper used for messages, public keys and proposal content.
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct Any {
    /// Type URLs use the format `/fully.qualified.protobuf.Name`
    #[prost(string, tag = "1")]
    pub type_url: String,

    /// Binary serialization of the protobuf message
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

impl Any {
    /// Wrap already encoded bytes
    pub fn new(type_url: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    /// Pack a message under its own type URL
    pub fn pack<M: MessageExt>(msg: &M) -> Self {
        Self::new(M::TYPE_URL, msg.encode_to_vec())
    }

    /// Unpack into a specific message type, checking the type URL
    pub fn unpack<M: MessageExt>(&self) -> Result<M> {
        if !self.is::<M>() {
            return Err(CodecError::TypeMismatch {
                expected: M::TYPE_URL.to_string(),
            });
        }
        Ok(M::decode(self.value.as_slice())?)
    }

    /// Check if this Any contains a message of the given type
    pub fn is<M: MessageExt>(&self) -> bool {
        self.type_url == M::TYPE_URL
    }
}

/// Extension trait for messages with a fixed type URL
pub trait MessageExt: Message + Default + Clone + Send + Sync + 'static {
    const TYPE_URL: &'static str;

    fn type_url(&self) -> &'static str {
        Self::TYPE_URL
    }
}
