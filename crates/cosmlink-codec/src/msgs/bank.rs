//! Bank module messages

use crate::protobuf::MessageExt;
use crate::registry::AminoConvert;
use crate::Result;
use cosmlink_math::Coin;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Send coins from one account to another
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ::prost::Message)]
pub struct MsgSend {
    #[prost(string, tag = "1")]
    pub from_address: String,
    #[prost(string, tag = "2")]
    pub to_address: String,
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<Coin>,
}

impl MsgSend {
    pub fn new(
        from_address: impl Into<String>,
        to_address: impl Into<String>,
        amount: Vec<Coin>,
    ) -> Self {
        Self {
            from_address: from_address.into(),
            to_address: to_address.into(),
            amount,
        }
    }
}

impl MessageExt for MsgSend {
    const TYPE_URL: &'static str = "/cosmos.bank.v1beta1.MsgSend";
}

impl AminoConvert for MsgSend {
    const AMINO_TYPE: &'static str = "cosmos-sdk/MsgSend";

    fn to_amino(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_amino(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }
}
