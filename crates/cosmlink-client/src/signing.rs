//! Signing client: build, sign and broadcast transactions

use crate::broadcast::{BroadcastOptions, BroadcastResult};
use crate::rpc::{HttpEndpoint, RpcClient};
use crate::stargate::StargateClient;
use crate::tx_builder::{SignedTx, TxBuilder};
use crate::{ClientError, Result};
use cosmlink_codec::msgs::MsgSend;
use cosmlink_codec::{default_registry, Registry, RegistryEntry, TypedMessage};
use cosmlink_log::{debug, warn};
use cosmlink_math::Coin;
use cosmlink_types::{
    BaseAccount, Fee, OfflineSigner, SignDoc, SignMode, Signature, SignerContext, SignerError,
    TxRaw, UnsignedTx,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Signing client configuration
#[derive(Debug, Clone, Default)]
pub struct SignerOptions {
    pub sign_mode: SignMode,
    pub broadcast: BroadcastOptions,
    /// Chain specific messages, registered over the base message set
    pub registry: Vec<RegistryEntry>,
}

/// Account number and next sequence of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountSequence {
    pub account_number: u64,
    pub sequence: u64,
}

type SequenceSlot = Arc<Mutex<Option<AccountSequence>>>;

/// Per-account locks around the locally known sequence
///
/// Holding an account's slot serializes submissions from that account, so
/// concurrent callers get consecutive sequence numbers instead of racing
/// on the value stored on chain.
///
/// Slots are kept for the life of the tracker, one per address that ever
/// signed through it. Call [`SequenceTracker::forget`] for addresses that
/// are done.
#[derive(Debug, Default)]
pub struct SequenceTracker {
    slots: Mutex<HashMap<String, SequenceSlot>>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, address: &str) -> SequenceSlot {
        let mut slots = self.slots.lock().await;
        slots.entry(address.to_string()).or_default().clone()
    }

    async fn existing(&self, address: &str) -> Option<SequenceSlot> {
        self.slots.lock().await.get(address).cloned()
    }

    /// Locally cached sequence, if any
    pub async fn cached(&self, address: &str) -> Option<AccountSequence> {
        let slot = self.existing(address).await?;
        let cached = *slot.lock().await;
        cached
    }

    /// Drop the cached sequence so the next submission re-queries the chain
    pub async fn reset(&self, address: &str) {
        if let Some(slot) = self.existing(address).await {
            *slot.lock().await = None;
        }
    }

    /// Remove the slot of an address that will not sign again
    ///
    /// A submission still holding the old slot finishes on it; the next one
    /// starts from a fresh slot and queries the chain.
    pub async fn forget(&self, address: &str) -> bool {
        self.slots.lock().await.remove(address).is_some()
    }

    /// Number of addresses with a slot
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Client that signs through an [`OfflineSigner`] and submits to a node
#[derive(Debug)]
pub struct SigningClient<S> {
    query: StargateClient,
    tx_builder: TxBuilder,
    signer: S,
    sign_mode: SignMode,
    broadcast: BroadcastOptions,
    sequences: SequenceTracker,
}

impl<S: OfflineSigner> SigningClient<S> {
    pub fn new(rpc: Arc<RpcClient>, signer: S, options: SignerOptions) -> Self {
        let registry = Registry::new(&default_registry(), options.registry);
        Self {
            query: StargateClient::new(rpc),
            tx_builder: TxBuilder::new(Arc::new(registry)),
            signer,
            sign_mode: options.sign_mode,
            broadcast: options.broadcast,
            sequences: SequenceTracker::new(),
        }
    }

    /// Open a signing client and resolve the chain id
    pub async fn connect_with_signer(
        endpoint: impl Into<HttpEndpoint>,
        signer: S,
        options: SignerOptions,
    ) -> Result<Self> {
        let client = Self::new(Arc::new(RpcClient::new(endpoint)?), signer, options);
        client.connect().await?;
        Ok(client)
    }

    /// Resolve the chain id. Later calls return the cached value.
    pub async fn connect(&self) -> Result<String> {
        self.query.chain_id().await
    }

    pub fn registry(&self) -> &Registry {
        self.tx_builder.registry()
    }

    pub fn query(&self) -> &StargateClient {
        &self.query
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    pub fn sign_mode(&self) -> SignMode {
        self.sign_mode
    }

    pub fn sequences(&self) -> &SequenceTracker {
        &self.sequences
    }

    pub fn build_unsigned(
        &self,
        messages: Vec<TypedMessage>,
        fee: Fee,
        memo: &str,
        signer: SignerContext,
    ) -> Result<UnsignedTx> {
        self.tx_builder.build_unsigned(messages, fee, memo, signer)
    }

    pub fn compute_sign_bytes(&self, tx: &UnsignedTx, mode: SignMode) -> Result<SignDoc> {
        self.tx_builder.compute_sign_bytes(tx, mode)
    }

    pub async fn sign(&self, sign_doc: &SignDoc, address: &str) -> Result<Signature> {
        self.signer
            .sign(address, sign_doc)
            .await
            .map_err(ClientError::SignerRejected)
    }

    pub fn serialize(
        &self,
        tx: &UnsignedTx,
        sign_doc: &SignDoc,
        signature: &Signature,
    ) -> Result<TxRaw> {
        self.tx_builder.serialize(tx, sign_doc, signature)
    }

    /// Signer context for `address` at the given account state
    pub async fn signer_context(
        &self,
        address: &str,
        account_number: u64,
        sequence: u64,
    ) -> Result<SignerContext> {
        let account = self
            .signer
            .get_accounts()
            .await?
            .into_iter()
            .find(|account| account.address == address)
            .ok_or_else(|| SignerError::AccountNotFound(address.to_string()))?;

        Ok(SignerContext {
            account_number,
            sequence,
            chain_id: self.query.chain_id().await?,
            pub_key: account.pub_key(),
        })
    }

    /// Build and sign a transaction without submitting it
    pub async fn sign_tx(
        &self,
        address: &str,
        messages: Vec<TypedMessage>,
        fee: Fee,
        memo: &str,
        account_number: u64,
        sequence: u64,
    ) -> Result<SignedTx> {
        let context = self.signer_context(address, account_number, sequence).await?;
        let tx = self.build_unsigned(messages, fee, memo, context)?;
        let sign_doc = self.compute_sign_bytes(&tx, self.sign_mode)?;
        let signature = self.sign(&sign_doc, address).await?;
        Ok(self.serialize(&tx, &sign_doc, &signature)?.into())
    }

    /// Sign with the next sequence of `address` and broadcast
    ///
    /// The returned result may still carry a nonzero code; pass it to
    /// [`assert_success`](crate::assert_success) to turn that into an error.
    pub async fn sign_and_broadcast(
        &self,
        address: &str,
        messages: Vec<TypedMessage>,
        fee: Fee,
        memo: &str,
    ) -> Result<BroadcastResult> {
        let slot = self.sequences.slot(address).await;
        let mut cached = slot.lock().await;

        let current = match *cached {
            Some(current) => current,
            None => {
                let account = self.query.query_account(address).await?;
                AccountSequence {
                    account_number: account.account_number,
                    sequence: account.sequence,
                }
            }
        };
        debug!(
            %address,
            account_number = current.account_number,
            sequence = current.sequence,
            "signing transaction"
        );

        let submitted = self.submit(address, messages, fee, memo, current).await;

        // CheckTx acceptance consumes the sequence even if the block never
        // confirms it within the timeout
        match &submitted {
            Ok(result) if result.check_tx.is_ok() => {
                *cached = Some(AccountSequence {
                    sequence: current.sequence + 1,
                    ..current
                });
            }
            _ => {
                if cached.is_some() {
                    warn!(%address, sequence = current.sequence, "resetting cached sequence");
                }
                *cached = None;
            }
        }
        drop(cached);

        self.query.confirm_tx(submitted?, &self.broadcast).await
    }

    async fn submit(
        &self,
        address: &str,
        messages: Vec<TypedMessage>,
        fee: Fee,
        memo: &str,
        current: AccountSequence,
    ) -> Result<BroadcastResult> {
        let signed = self
            .sign_tx(
                address,
                messages,
                fee,
                memo,
                current.account_number,
                current.sequence,
            )
            .await?;
        self.query
            .submit_tx(&signed.tx_bytes, &self.broadcast)
            .await
    }

    /// Send `amount` from `sender` to `recipient`
    pub async fn send_tokens(
        &self,
        sender: &str,
        recipient: &str,
        amount: Vec<Coin>,
        fee: Fee,
        memo: &str,
    ) -> Result<BroadcastResult> {
        let msg = TypedMessage::new(MsgSend::new(sender, recipient, amount));
        self.sign_and_broadcast(sender, vec![msg], fee, memo).await
    }

    pub async fn query_account(&self, address: &str) -> Result<BaseAccount> {
        self.query.query_account(address).await
    }

    pub async fn get_balance(&self, address: &str, denom: &str) -> Result<Coin> {
        self.query.get_balance(address, denom).await
    }
}
