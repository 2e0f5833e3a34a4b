//! Unsigned transactions, sign documents and signatures

use crate::error::Result;
use crate::proto::{FeeProto, SignDocProto, SignModeProto};
use crate::signer::PubKey;
use cosmlink_codec::{canonical_json, AminoMsg, TypedMessage};
use cosmlink_math::{calculate_fee, Coin, CoinError, GasPrice};
use prost::Message;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How sign bytes are produced
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignMode {
    /// Protobuf `SignDoc`
    #[default]
    Direct,
    /// Legacy canonical amino JSON
    Amino,
}

impl SignMode {
    pub fn to_proto(self) -> SignModeProto {
        match self {
            SignMode::Direct => SignModeProto::Direct,
            SignMode::Amino => SignModeProto::LegacyAminoJson,
        }
    }
}

impl fmt::Display for SignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignMode::Direct => write!(f, "direct"),
            SignMode::Amino => write!(f, "amino"),
        }
    }
}

impl FromStr for SignMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "direct" => Ok(SignMode::Direct),
            "amino" => Ok(SignMode::Amino),
            other => Err(format!("unknown sign mode {other}")),
        }
    }
}

/// Transaction fee
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas_limit: u64,
    #[serde(default)]
    pub payer: String,
    #[serde(default)]
    pub granter: String,
}

impl Fee {
    pub fn new(amount: Vec<Coin>, gas_limit: u64) -> Self {
        Self {
            amount,
            gas_limit,
            payer: String::new(),
            granter: String::new(),
        }
    }

    /// Fee paying `gas_price` for each unit of `gas_limit`
    pub fn from_gas_price(gas_limit: u64, gas_price: &GasPrice) -> std::result::Result<Self, CoinError> {
        Ok(Self::new(vec![calculate_fee(gas_limit, gas_price)?], gas_limit))
    }

    pub fn to_proto(&self) -> FeeProto {
        FeeProto {
            amount: self.amount.clone(),
            gas_limit: self.gas_limit,
            payer: self.payer.clone(),
            granter: self.granter.clone(),
        }
    }

    /// Legacy JSON form. Payer and granter only appear when set.
    pub fn to_std_fee(&self) -> StdFee {
        StdFee {
            amount: self.amount.clone(),
            gas: self.gas_limit.to_string(),
            payer: (!self.payer.is_empty()).then(|| self.payer.clone()),
            granter: (!self.granter.is_empty()).then(|| self.granter.clone()),
        }
    }
}

/// Fee as it appears in a `StdSignDoc`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
    pub amount: Vec<Coin>,
    pub gas: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granter: Option<String>,
}

/// Account state a transaction is signed against
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerContext {
    pub account_number: u64,
    pub sequence: u64,
    pub chain_id: String,
    pub pub_key: PubKey,
}

/// A transaction before signing
#[derive(Clone, Debug)]
pub struct UnsignedTx {
    pub messages: Vec<TypedMessage>,
    pub fee: Fee,
    pub memo: String,
    pub timeout_height: u64,
    pub signer: SignerContext,
}

/// Legacy amino JSON sign document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StdSignDoc {
    pub account_number: String,
    pub chain_id: String,
    pub fee: StdFee,
    pub memo: String,
    pub msgs: Vec<AminoMsg>,
    pub sequence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_height: Option<String>,
}

/// The document a signer signs, in one of the two supported encodings
#[derive(Clone, Debug, PartialEq)]
pub enum SignDoc {
    Direct(SignDocProto),
    Amino(StdSignDoc),
}

impl SignDoc {
    pub fn mode(&self) -> SignMode {
        match self {
            SignDoc::Direct(_) => SignMode::Direct,
            SignDoc::Amino(_) => SignMode::Amino,
        }
    }

    pub fn chain_id(&self) -> &str {
        match self {
            SignDoc::Direct(doc) => &doc.chain_id,
            SignDoc::Amino(doc) => &doc.chain_id,
        }
    }

    /// Bytes to be signed: the protobuf encoding for direct mode, canonical
    /// JSON for amino mode
    pub fn sign_bytes(&self) -> Result<Vec<u8>> {
        match self {
            SignDoc::Direct(doc) => Ok(doc.encode_to_vec()),
            SignDoc::Amino(doc) => {
                let value = serde_json::to_value(doc)?;
                Ok(canonical_json(&value).into_bytes())
            }
        }
    }
}

/// Signature produced by an offline signer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub signature: Vec<u8>,
    pub pub_key: PubKey,
}
