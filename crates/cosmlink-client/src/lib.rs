//! Client library for Cosmos SDK chains.
//!
//! This crate talks to a CometBFT node over JSON-RPC: ABCI queries,
//! transaction broadcast and confirmation. On top of the transport it
//! provides a read-only [`StargateClient`] and a [`SigningClient`] that
//! builds, signs and submits transactions through an
//! [`OfflineSigner`](cosmlink_types::OfflineSigner).

pub mod broadcast;
pub mod config;
mod de;
pub mod rpc;
pub mod signing;
pub mod stargate;
pub mod tx_builder;

pub use broadcast::{
    assert_success, find_attribute, sleep, wait_for_tx, wait_until, AbciResponse,
    BroadcastOptions, BroadcastResult, Event, EventAttribute, WaitOptions, MIN_POLL_INTERVAL,
};
pub use config::{BroadcastConfig, ClientConfig, ConfigError};
pub use rpc::{BroadcastMode, HttpEndpoint, NodeStatus, RpcClient};
pub use signing::{AccountSequence, SequenceTracker, SignerOptions, SigningClient};
pub use stargate::StargateClient;
pub use tx_builder::{SignedTx, TxBuilder};

use cosmlink_codec::CodecError;
use cosmlink_math::CoinError;
use cosmlink_types::{SignerError, TxError};
use std::time::Duration;
use thiserror::Error;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("transaction has no messages")]
    EmptyMessageList,

    /// The offline signer refused or failed to sign
    #[error("signer rejected the sign request: {0}")]
    SignerRejected(SignerError),

    #[error("signer error: {0}")]
    Signer(#[from] SignerError),

    /// Network failure talking to the node
    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The node answered with a non-2xx status and no JSON-RPC error body
    #[error("http status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// JSON-RPC envelope error
    #[error("rpc error {code}: {message} {data}")]
    Rpc {
        code: i64,
        message: String,
        data: String,
    },

    /// ABCI query failure, carrying the node's log verbatim
    #[error("query failed: {0}")]
    Chain(String),

    /// Transaction rejected in check or deliver
    #[error("transaction failed with code {code}: {log}")]
    ChainExecution { code: u32, log: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("transaction error: {0}")]
    Tx(#[from] TxError),

    #[error("coin error: {0}")]
    Coin(#[from] CoinError),

    #[error("failed to decode protobuf: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("json parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("account not found: {0}")]
    AccountNotFound(String),
}

impl ClientError {
    /// True for node answers that mean "does not exist (yet)"
    pub fn is_not_found(&self) -> bool {
        match self {
            ClientError::Rpc { message, data, .. } => {
                message.contains("not found") || data.contains("not found")
            }
            ClientError::Chain(log) => log.contains("not found"),
            ClientError::AccountNotFound(_) => true,
            _ => false,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
