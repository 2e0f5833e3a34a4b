//! In-memory secp256k1 signer

use crate::address::address_from_pubkey;
use crate::{CryptoError, Result};
use async_trait::async_trait;
use cosmlink_types::{AccountData, Algo, OfflineSigner, PubKey, SignDoc, Signature, SignerError};
use k256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use signature::{Signer, Verifier};
use std::fmt;

/// Signs with a single secp256k1 key held in memory
///
/// Both direct and amino sign bytes are hashed with SHA-256 and signed with
/// RFC 6979 ECDSA. Signatures are the 64 byte `r || s` form with low `s`.
#[derive(Clone)]
pub struct Secp256k1Signer {
    key: SigningKey,
    account: AccountData,
}

impl Secp256k1Signer {
    pub fn from_bytes(secret: &[u8], prefix: &str) -> Result<Self> {
        let key =
            SigningKey::from_slice(secret).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let pub_key = key
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        let address = address_from_pubkey(prefix, &pub_key)?;

        Ok(Self {
            key,
            account: AccountData {
                address,
                algo: Algo::Secp256k1,
                pub_key,
            },
        })
    }

    pub fn from_hex(secret: &str, prefix: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(secret)?, prefix)
    }

    pub fn address(&self) -> &str {
        &self.account.address
    }

    pub fn pub_key(&self) -> PubKey {
        self.account.pub_key()
    }

    pub fn account(&self) -> &AccountData {
        &self.account
    }

    /// Check a signature produced over `message` by `pub_key`
    pub fn verify(pub_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_sec1_bytes(pub_key) else {
            return false;
        };
        let Ok(signature) = EcdsaSignature::from_slice(signature) else {
            return false;
        };
        key.verify(message, &signature).is_ok()
    }
}

impl fmt::Debug for Secp256k1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1Signer")
            .field("address", &self.account.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OfflineSigner for Secp256k1Signer {
    async fn get_accounts(&self) -> std::result::Result<Vec<AccountData>, SignerError> {
        Ok(vec![self.account.clone()])
    }

    async fn sign(
        &self,
        address: &str,
        sign_doc: &SignDoc,
    ) -> std::result::Result<Signature, SignerError> {
        if address != self.account.address {
            return Err(SignerError::AccountNotFound(address.to_string()));
        }

        let bytes = sign_doc
            .sign_bytes()
            .map_err(|e| SignerError::Encoding(e.to_string()))?;
        let signature: EcdsaSignature = self
            .key
            .try_sign(&bytes)
            .map_err(|e| SignerError::Rejected(e.to_string()))?;

        Ok(Signature {
            signature: signature.to_bytes().to_vec(),
            pub_key: self.pub_key(),
        })
    }
}
