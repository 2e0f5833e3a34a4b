//! Bech32 account addresses

use crate::{CryptoError, Result};
use bech32::{Bech32, Hrp};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Account address for a compressed secp256k1 public key:
/// bech32(prefix, ripemd160(sha256(pubkey)))
pub fn address_from_pubkey(prefix: &str, pubkey_bytes: &[u8]) -> Result<String> {
    let sha256_hash = Sha256::digest(pubkey_bytes);
    let ripemd160_hash = Ripemd160::digest(sha256_hash);

    let hrp = Hrp::parse(prefix).map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
    bech32::encode::<Bech32>(hrp, &ripemd160_hash)
        .map_err(|e| CryptoError::InvalidAddress(e.to_string()))
}

/// Split an address into its prefix and 20 byte payload
pub fn decode_address(address: &str) -> Result<(String, [u8; 20])> {
    let (hrp, data) =
        bech32::decode(address).map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
    let bytes: [u8; 20] = data
        .try_into()
        .map_err(|_| CryptoError::InvalidAddress(format!("invalid address length: {address}")))?;
    Ok((hrp.to_string(), bytes))
}
