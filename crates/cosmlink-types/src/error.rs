//! Error handling for transaction types

use cosmlink_codec::CodecError;
use cosmlink_math::CoinError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TxError {
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("invalid fee: {0}")]
    Fee(#[from] CoinError),

    #[error("failed to decode transaction: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("unsupported account type: {0}")]
    UnsupportedAccount(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TxError>;
