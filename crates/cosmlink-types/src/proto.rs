//! Protobuf wire types for transactions, accounts and queries

use crate::error::{Result, TxError};
use cosmlink_codec::{Any, MessageExt};
use cosmlink_math::Coin;
use prost::Message;
use sha2::{Digest, Sha256};

/// Protobuf representation of transaction body
#[derive(Clone, PartialEq, Message)]
pub struct TxBodyProto {
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    #[prost(string, tag = "2")]
    pub memo: String,
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
    #[prost(message, repeated, tag = "1023")]
    pub extension_options: Vec<Any>,
    #[prost(message, repeated, tag = "2047")]
    pub non_critical_extension_options: Vec<Any>,
}

/// Protobuf representation of auth info
#[derive(Clone, PartialEq, Message)]
pub struct AuthInfoProto {
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfoProto>,
    #[prost(message, optional, tag = "2")]
    pub fee: Option<FeeProto>,
}

/// Protobuf representation of signer info
#[derive(Clone, PartialEq, Message)]
pub struct SignerInfoProto {
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    #[prost(message, optional, tag = "2")]
    pub mode_info: Option<ModeInfoProto>,
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

/// Protobuf representation of mode info
#[derive(Clone, PartialEq, Message)]
pub struct ModeInfoProto {
    #[prost(oneof = "mode_info_proto::Sum", tags = "1")]
    pub sum: Option<mode_info_proto::Sum>,
}

impl ModeInfoProto {
    pub fn single(mode: SignModeProto) -> Self {
        Self {
            sum: Some(mode_info_proto::Sum::Single(ModeInfoSingleProto {
                mode: mode as i32,
            })),
        }
    }
}

/// Nested module for mode info variants
pub mod mode_info_proto {
    use super::*;

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Sum {
        #[prost(message, tag = "1")]
        Single(ModeInfoSingleProto),
    }
}

/// Protobuf representation of single mode info
#[derive(Clone, PartialEq, Message)]
pub struct ModeInfoSingleProto {
    #[prost(enumeration = "SignModeProto", tag = "1")]
    pub mode: i32,
}

/// Protobuf representation of fee
#[derive(Clone, PartialEq, Message)]
pub struct FeeProto {
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    #[prost(string, tag = "3")]
    pub payer: String,
    #[prost(string, tag = "4")]
    pub granter: String,
}

/// Sign mode enumeration as it appears on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum SignModeProto {
    Unspecified = 0,
    Direct = 1,
    Textual = 2,
    LegacyAminoJson = 127,
}

/// Direct mode sign document
#[derive(Clone, PartialEq, Message)]
pub struct SignDocProto {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(string, tag = "3")]
    pub chain_id: String,
    #[prost(uint64, tag = "4")]
    pub account_number: u64,
}

/// Signed transaction in the form submitted to a node
#[derive(Clone, PartialEq, Message)]
pub struct TxRaw {
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

impl TxRaw {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Transaction hash as reported by CometBFT: uppercase hex SHA-256 of
    /// the encoded bytes
    pub fn hash(&self) -> String {
        tx_hash(&self.to_bytes())
    }
}

/// Uppercase hex SHA-256 of encoded transaction bytes
pub fn tx_hash(tx_bytes: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(tx_bytes))
}

/// Public key wrapper shared by the secp256k1 family and ed25519
#[derive(Clone, PartialEq, Message)]
pub struct PubKeyProto {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

/// Auth module account
#[derive(Clone, PartialEq, Message)]
pub struct BaseAccount {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(message, optional, tag = "2")]
    pub pub_key: Option<Any>,
    #[prost(uint64, tag = "3")]
    pub account_number: u64,
    #[prost(uint64, tag = "4")]
    pub sequence: u64,
}

impl MessageExt for BaseAccount {
    const TYPE_URL: &'static str = "/cosmos.auth.v1beta1.BaseAccount";
}

/// Any account type that embeds a `BaseAccount` as its first field, e.g.
/// vesting and module accounts
#[derive(Clone, PartialEq, Message)]
pub struct WrappedBaseAccount {
    #[prost(message, optional, tag = "1")]
    pub base_account: Option<BaseAccount>,
}

impl BaseAccount {
    /// Extract the base account from an account `Any`
    pub fn from_any(any: &Any) -> Result<Self> {
        if any.type_url == Self::TYPE_URL {
            return Ok(Self::decode(any.value.as_slice())?);
        }

        // Deeper nesting, e.g. a continuous vesting account wrapping a base
        // vesting account, is not unwrapped
        WrappedBaseAccount::decode(any.value.as_slice())?
            .base_account
            .ok_or_else(|| TxError::UnsupportedAccount(any.type_url.clone()))
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryAccountRequest {
    #[prost(string, tag = "1")]
    pub address: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryAccountResponse {
    #[prost(message, optional, tag = "1")]
    pub account: Option<Any>,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryBalanceRequest {
    #[prost(string, tag = "1")]
    pub address: String,
    #[prost(string, tag = "2")]
    pub denom: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct QueryBalanceResponse {
    #[prost(message, optional, tag = "1")]
    pub balance: Option<Coin>,
}
