//! Governance module messages

use crate::protobuf::{Any, MessageExt};
use crate::registry::AminoConvert;
use crate::{CodecError, Result};
use cosmlink_math::Coin;
use serde_json::{json, Value};

/// Amino type of the legacy text proposal content
pub const TEXT_PROPOSAL_AMINO_TYPE: &str = "cosmos-sdk/TextProposal";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum VoteOption {
    Unspecified = 0,
    Yes = 1,
    Abstain = 2,
    No = 3,
    NoWithVeto = 4,
}

/// Cast a vote on a proposal
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct MsgVote {
    #[prost(uint64, tag = "1")]
    pub proposal_id: u64,
    #[prost(string, tag = "2")]
    pub voter: String,
    #[prost(enumeration = "VoteOption", tag = "3")]
    pub option: i32,
}

impl MsgVote {
    pub fn new(proposal_id: u64, voter: impl Into<String>, option: VoteOption) -> Self {
        Self {
            proposal_id,
            voter: voter.into(),
            option: option as i32,
        }
    }
}

impl MessageExt for MsgVote {
    const TYPE_URL: &'static str = "/cosmos.gov.v1beta1.MsgVote";
}

impl AminoConvert for MsgVote {
    const AMINO_TYPE: &'static str = "cosmos-sdk/MsgVote";

    fn to_amino(&self) -> Result<Value> {
        Ok(json!({
            "proposal_id": self.proposal_id.to_string(),
            "voter": self.voter,
            "option": self.option,
        }))
    }

    fn from_amino(value: &Value) -> Result<Self> {
        let option = value["option"]
            .as_i64()
            .and_then(|o| i32::try_from(o).ok())
            .filter(|o| VoteOption::try_from(*o).is_ok())
            .ok_or_else(|| CodecError::Amino(format!("invalid vote option: {}", value["option"])))?;

        Ok(Self {
            proposal_id: uint_field(value, "proposal_id")?,
            voter: string_field(value, "voter")?,
            option,
        })
    }
}

/// Legacy free-form proposal content
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct TextProposal {
    #[prost(string, tag = "1")]
    pub title: String,
    #[prost(string, tag = "2")]
    pub description: String,
}

impl MessageExt for TextProposal {
    const TYPE_URL: &'static str = "/cosmos.gov.v1beta1.TextProposal";
}

/// Submit a proposal with an initial deposit
#[derive(Clone, PartialEq, Eq, ::prost::Message)]
pub struct MsgSubmitProposal {
    #[prost(message, optional, tag = "1")]
    pub content: Option<Any>,
    #[prost(message, repeated, tag = "2")]
    pub initial_deposit: Vec<Coin>,
    #[prost(string, tag = "3")]
    pub proposer: String,
}

impl MsgSubmitProposal {
    pub fn text(
        proposal: &TextProposal,
        initial_deposit: Vec<Coin>,
        proposer: impl Into<String>,
    ) -> Self {
        Self {
            content: Some(Any::pack(proposal)),
            initial_deposit,
            proposer: proposer.into(),
        }
    }
}

impl MessageExt for MsgSubmitProposal {
    const TYPE_URL: &'static str = "/cosmos.gov.v1beta1.MsgSubmitProposal";
}

impl AminoConvert for MsgSubmitProposal {
    const AMINO_TYPE: &'static str = "cosmos-sdk/MsgSubmitProposal";

    fn to_amino(&self) -> Result<Value> {
        let content = match &self.content {
            Some(any) => {
                let proposal: TextProposal = any.unpack()?;
                json!({
                    "type": TEXT_PROPOSAL_AMINO_TYPE,
                    "value": {
                        "title": proposal.title,
                        "description": proposal.description,
                    },
                })
            }
            None => Value::Null,
        };

        Ok(json!({
            "content": content,
            "initial_deposit": serde_json::to_value(&self.initial_deposit)?,
            "proposer": self.proposer,
        }))
    }

    fn from_amino(value: &Value) -> Result<Self> {
        let content = match &value["content"] {
            Value::Null => None,
            content => {
                if content["type"] != TEXT_PROPOSAL_AMINO_TYPE {
                    return Err(CodecError::Amino(format!(
                        "unsupported proposal content: {}",
                        content["type"]
                    )));
                }
                let proposal = TextProposal {
                    title: string_field(&content["value"], "title")?,
                    description: string_field(&content["value"], "description")?,
                };
                Some(Any::pack(&proposal))
            }
        };

        let initial_deposit = match &value["initial_deposit"] {
            Value::Null => Vec::new(),
            deposit => serde_json::from_value(deposit.clone())?,
        };

        Ok(Self {
            content,
            initial_deposit,
            proposer: string_field(value, "proposer")?,
        })
    }
}

fn string_field(value: &Value, field: &str) -> Result<String> {
    value[field]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CodecError::Amino(format!("missing string field {field}")))
}

/// Amino renders 64-bit integers as strings; plain numbers are accepted too
fn uint_field(value: &Value, field: &str) -> Result<u64> {
    let parsed = match &value[field] {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| CodecError::Amino(format!("invalid integer field {field}: {}", value[field])))
}
