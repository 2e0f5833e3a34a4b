//! Core transaction types for cosmlink
//!
//! This crate provides the protobuf transaction envelope, the unsigned
//! transaction and sign document types, and the [`OfflineSigner`]
//! capability that signing clients delegate to.

pub mod error;
pub mod proto;
pub mod signer;
pub mod tx;

pub use error::TxError;
pub use proto::{
    BaseAccount, QueryAccountRequest, QueryAccountResponse, QueryBalanceRequest,
    QueryBalanceResponse, SignDocProto, TxRaw,
};
pub use signer::{AccountData, Algo, OfflineSigner, PubKey, SignerError};
pub use tx::{Fee, SignDoc, SignMode, Signature, SignerContext, StdFee, StdSignDoc, UnsignedTx};
