//! Client-side protocol stack for Cosmos SDK chains.
//!
//! Re-exports the workspace crates under one roof:
//!
//! - [`math`]: exact decimals, coins and gas prices
//! - [`codec`]: message registry, protobuf `Any` and canonical amino JSON
//! - [`types`]: transaction types, sign documents and the offline signer trait
//! - [`crypto`]: an in-memory secp256k1 signer
//! - [`client`]: JSON-RPC transport, query and signing clients
//! - [`log`]: tracing setup

pub use cosmlink_client as client;
pub use cosmlink_codec as codec;
pub use cosmlink_crypto as crypto;
pub use cosmlink_log as log;
pub use cosmlink_math as math;
pub use cosmlink_types as types;

pub use cosmlink_client::{
    assert_success, BroadcastOptions, BroadcastResult, ClientConfig, ClientError, HttpEndpoint,
    RpcClient, SignerOptions, SigningClient, StargateClient,
};
pub use cosmlink_codec::{default_registry, Registry, RegistryEntry, TypedMessage};
pub use cosmlink_crypto::Secp256k1Signer;
pub use cosmlink_math::{Coin, Decimal, GasPrice};
pub use cosmlink_types::{Fee, OfflineSigner, SignMode};
