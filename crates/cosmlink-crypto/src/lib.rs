//! Cryptographic primitives for cosmlink
//!
//! Provides a concrete secp256k1 [`OfflineSigner`](cosmlink_types::OfflineSigner)
//! and the address derivation it depends on.

pub mod address;
pub mod signer;

use thiserror::Error;

pub use address::{address_from_pubkey, decode_address};
pub use signer::Secp256k1Signer;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
