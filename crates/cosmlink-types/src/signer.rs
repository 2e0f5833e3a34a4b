//! Offline signer capability
//!
//! A signer owns key material and turns a [`SignDoc`] into a [`Signature`].
//! Clients never see private keys; they only know the accounts a signer
//! exposes and ask it to sign.

use crate::proto::PubKeyProto;
use crate::tx::{SignDoc, Signature};
use async_trait::async_trait;
use cosmlink_codec::Any;
use prost::Message;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("signing rejected: {0}")]
    Rejected(String),

    #[error("unsupported sign mode: {0}")]
    UnsupportedSignMode(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Key algorithm of an account
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algo {
    Secp256k1,
    EthSecp256k1,
    Ed25519,
}

impl Algo {
    /// Protobuf type URL of public keys using this algorithm
    pub fn pub_key_type_url(self) -> &'static str {
        match self {
            Algo::Secp256k1 => "/cosmos.crypto.secp256k1.PubKey",
            Algo::EthSecp256k1 => "/ethermint.crypto.v1.ethsecp256k1.PubKey",
            Algo::Ed25519 => "/cosmos.crypto.ed25519.PubKey",
        }
    }
}

/// Public key tagged with its algorithm
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PubKey {
    pub algo: Algo,
    pub key: Vec<u8>,
}

impl PubKey {
    pub fn new(algo: Algo, key: Vec<u8>) -> Self {
        Self { algo, key }
    }

    pub fn type_url(&self) -> &'static str {
        self.algo.pub_key_type_url()
    }

    /// Encode as the `Any` placed in a signer info
    pub fn to_any(&self) -> Any {
        let proto = PubKeyProto {
            key: self.key.clone(),
        };
        Any::new(self.type_url(), proto.encode_to_vec())
    }
}

/// An account exposed by a signer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountData {
    pub address: String,
    pub algo: Algo,
    pub pub_key: Vec<u8>,
}

impl AccountData {
    pub fn pub_key(&self) -> PubKey {
        PubKey::new(self.algo, self.pub_key.clone())
    }
}

/// Signing capability backed by key material the client never sees
#[async_trait]
pub trait OfflineSigner: Send + Sync {
    /// Accounts this signer can sign for
    async fn get_accounts(&self) -> Result<Vec<AccountData>, SignerError>;

    /// Sign a document on behalf of `address`
    async fn sign(&self, address: &str, sign_doc: &SignDoc) -> Result<Signature, SignerError>;
}

#[async_trait]
impl<S: OfflineSigner + ?Sized> OfflineSigner for Arc<S> {
    async fn get_accounts(&self) -> Result<Vec<AccountData>, SignerError> {
        (**self).get_accounts().await
    }

    async fn sign(&self, address: &str, sign_doc: &SignDoc) -> Result<Signature, SignerError> {
        (**self).sign(address, sign_doc).await
    }
}
