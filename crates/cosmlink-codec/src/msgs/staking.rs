//! Staking module messages

use crate::protobuf::MessageExt;
use crate::registry::AminoConvert;
use crate::Result;
use cosmlink_math::Coin;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Delegate coins from a delegator to a validator
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ::prost::Message)]
pub struct MsgDelegate {
    #[prost(string, tag = "1")]
    pub delegator_address: String,
    #[prost(string, tag = "2")]
    pub validator_address: String,
    #[prost(message, optional, tag = "3")]
    pub amount: Option<Coin>,
}

impl MessageExt for MsgDelegate {
    const TYPE_URL: &'static str = "/cosmos.staking.v1beta1.MsgDelegate";
}

impl AminoConvert for MsgDelegate {
    const AMINO_TYPE: &'static str = "cosmos-sdk/MsgDelegate";

    fn to_amino(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_amino(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }
}
