//! Message registry for dynamic message dispatch
//!
//! The registry maps a type URL to the functions that move a message between
//! its Rust value, protobuf bytes and amino JSON. It is assembled once with
//! [`RegistryBuilder`] and is read-only afterwards, so it can be shared
//! behind an `Arc` by any number of clients.

use crate::protobuf::{Any, MessageExt};
use crate::{CodecError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any as StdAny;
use std::collections::HashMap;
use std::fmt;

/// Type-erased message value
pub trait Msg: fmt::Debug + Send + Sync + 'static {
    fn as_any(&self) -> &dyn StdAny;

    fn clone_box(&self) -> Box<dyn Msg>;
}

impl<T> Msg for T
where
    T: fmt::Debug + Clone + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn StdAny {
        self
    }

    fn clone_box(&self) -> Box<dyn Msg> {
        Box::new(self.clone())
    }
}

/// Conversion to and from the legacy amino JSON form
pub trait AminoConvert: Sized {
    /// Amino type name, e.g. `cosmos-sdk/MsgSend`
    const AMINO_TYPE: &'static str;

    fn to_amino(&self) -> Result<Value>;

    fn from_amino(value: &Value) -> Result<Self>;
}

/// Amino JSON message as it appears in a `StdSignDoc`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AminoMsg {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

/// A message paired with the type URL it is registered under
#[derive(Debug)]
pub struct TypedMessage {
    pub type_url: String,
    pub value: Box<dyn Msg>,
}

impl TypedMessage {
    pub fn new<M: MessageExt>(msg: M) -> Self {
        Self {
            type_url: M::TYPE_URL.to_string(),
            value: Box::new(msg),
        }
    }

    /// Pair an arbitrary value with a type URL, e.g. for chain specific
    /// messages registered through [`RegistryEntry::new`]
    pub fn from_parts(type_url: impl Into<String>, value: Box<dyn Msg>) -> Self {
        Self {
            type_url: type_url.into(),
            value,
        }
    }

    pub fn downcast_ref<M: 'static>(&self) -> Option<&M> {
        self.value.as_any().downcast_ref::<M>()
    }
}

impl Clone for TypedMessage {
    fn clone(&self) -> Self {
        Self {
            type_url: self.type_url.clone(),
            value: self.value.as_ref().clone_box(),
        }
    }
}

pub type EncodeFn = fn(&dyn Msg) -> Result<Vec<u8>>;
pub type DecodeFn = fn(&[u8]) -> Result<Box<dyn Msg>>;
pub type ToAminoFn = fn(&dyn Msg) -> Result<Value>;
pub type FromAminoFn = fn(&Value) -> Result<Box<dyn Msg>>;

/// Codec functions for a single message type
#[derive(Clone)]
pub struct RegistryEntry {
    pub type_url: String,
    pub amino_type: String,
    pub encode: EncodeFn,
    pub decode: DecodeFn,
    pub to_amino: ToAminoFn,
    pub from_amino: FromAminoFn,
}

impl RegistryEntry {
    /// Entry for a message type that knows its own encodings
    pub fn of<M: MessageExt + AminoConvert>() -> Self {
        Self {
            type_url: M::TYPE_URL.to_string(),
            amino_type: M::AMINO_TYPE.to_string(),
            encode: encode_typed::<M>,
            decode: decode_typed::<M>,
            to_amino: to_amino_typed::<M>,
            from_amino: from_amino_typed::<M>,
        }
    }

    /// Entry built from explicit functions
    pub fn new(
        type_url: impl Into<String>,
        amino_type: impl Into<String>,
        encode: EncodeFn,
        decode: DecodeFn,
        to_amino: ToAminoFn,
        from_amino: FromAminoFn,
    ) -> Self {
        Self {
            type_url: type_url.into(),
            amino_type: amino_type.into(),
            encode,
            decode,
            to_amino,
            from_amino,
        }
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("type_url", &self.type_url)
            .field("amino_type", &self.amino_type)
            .finish_non_exhaustive()
    }
}

fn downcast<M: MessageExt>(msg: &dyn Msg) -> Result<&M> {
    msg.as_any()
        .downcast_ref::<M>()
        .ok_or_else(|| CodecError::TypeMismatch {
            expected: M::TYPE_URL.to_string(),
        })
}

fn encode_typed<M: MessageExt>(msg: &dyn Msg) -> Result<Vec<u8>> {
    Ok(downcast::<M>(msg)?.encode_to_vec())
}

fn decode_typed<M: MessageExt>(bytes: &[u8]) -> Result<Box<dyn Msg>> {
    Ok(Box::new(M::decode(bytes)?))
}

fn to_amino_typed<M: MessageExt + AminoConvert>(msg: &dyn Msg) -> Result<Value> {
    downcast::<M>(msg)?.to_amino()
}

fn from_amino_typed<M: MessageExt + AminoConvert>(value: &Value) -> Result<Box<dyn Msg>> {
    Ok(Box::new(M::from_amino(value)?))
}

/// Collects entries before the registry is frozen
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<RegistryEntry>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, entry: RegistryEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn register_all(mut self, entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Freeze the registry. Later registrations of a type URL replace
    /// earlier ones.
    pub fn build(self) -> Registry {
        let mut order = Vec::new();
        let mut entries = HashMap::new();
        for entry in self.entries {
            if !entries.contains_key(&entry.type_url) {
                order.push(entry.type_url.clone());
            }
            entries.insert(entry.type_url.clone(), entry);
        }

        let mut amino_index = HashMap::new();
        for type_url in &order {
            if let Some(entry) = entries.get(type_url) {
                amino_index.insert(entry.amino_type.clone(), type_url.clone());
            }
        }

        Registry {
            order,
            entries,
            amino_index,
        }
    }
}

/// Immutable message registry
#[derive(Debug, Clone, Default)]
pub struct Registry {
    order: Vec<String>,
    entries: HashMap<String, RegistryEntry>,
    amino_index: HashMap<String, String>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Merge `extra` over `base`; entries in `extra` win
    pub fn new(base: &Registry, extra: impl IntoIterator<Item = RegistryEntry>) -> Self {
        Registry::builder()
            .register_all(base.entries())
            .register_all(extra)
            .build()
    }

    /// Entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = RegistryEntry> + '_ {
        self.order
            .iter()
            .filter_map(|type_url| self.entries.get(type_url).cloned())
    }

    pub fn get(&self, type_url: &str) -> Result<&RegistryEntry> {
        self.entries
            .get(type_url)
            .ok_or_else(|| CodecError::UnknownTypeUrl(type_url.to_string()))
    }

    pub fn contains(&self, type_url: &str) -> bool {
        self.entries.contains_key(type_url)
    }

    pub fn type_urls(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode_binary(&self, type_url: &str, msg: &dyn Msg) -> Result<Vec<u8>> {
        (self.get(type_url)?.encode)(msg)
    }

    pub fn decode_binary(&self, type_url: &str, bytes: &[u8]) -> Result<Box<dyn Msg>> {
        (self.get(type_url)?.decode)(bytes)
    }

    pub fn to_amino(&self, type_url: &str, msg: &dyn Msg) -> Result<AminoMsg> {
        let entry = self.get(type_url)?;
        Ok(AminoMsg {
            kind: entry.amino_type.clone(),
            value: (entry.to_amino)(msg)?,
        })
    }

    pub fn from_amino(&self, type_url: &str, value: &Value) -> Result<Box<dyn Msg>> {
        (self.get(type_url)?.from_amino)(value)
    }

    /// Find the type URL registered for an amino type
    pub fn lookup_by_amino_type(&self, amino_type: &str) -> Result<&str> {
        self.amino_index
            .get(amino_type)
            .map(String::as_str)
            .ok_or_else(|| CodecError::UnknownAminoType(amino_type.to_string()))
    }

    /// Convert an amino message back to a typed message
    pub fn decode_amino_msg(&self, msg: &AminoMsg) -> Result<TypedMessage> {
        let type_url = self.lookup_by_amino_type(&msg.kind)?;
        let value = self.from_amino(type_url, &msg.value)?;
        Ok(TypedMessage::from_parts(type_url, value))
    }

    pub fn encode_any(&self, msg: &TypedMessage) -> Result<Any> {
        let value = self.encode_binary(&msg.type_url, msg.value.as_ref())?;
        Ok(Any::new(msg.type_url.clone(), value))
    }

    pub fn decode_any(&self, any: &Any) -> Result<TypedMessage> {
        let value = self.decode_binary(&any.type_url, &any.value)?;
        Ok(TypedMessage::from_parts(any.type_url.clone(), value))
    }
}
