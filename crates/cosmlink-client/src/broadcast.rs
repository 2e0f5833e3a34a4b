//! Broadcast results, confirmation and event lookup

use crate::de::{base64_opt, str_or_num};
use crate::rpc::RpcClient;
use crate::{ClientError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use cosmlink_log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;

/// Result of CheckTx or DeliverTx
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbciResponse {
    #[serde(default, deserialize_with = "str_or_num")]
    pub code: u32,
    #[serde(default, deserialize_with = "str_or_num")]
    pub codespace: String,
    #[serde(default, deserialize_with = "str_or_num")]
    pub log: String,
    #[serde(default, deserialize_with = "base64_opt")]
    pub data: Option<Vec<u8>>,
    #[serde(default, deserialize_with = "str_or_num")]
    pub gas_wanted: i64,
    #[serde(default, deserialize_with = "str_or_num")]
    pub gas_used: i64,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl AbciResponse {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// ABCI event
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<EventAttribute>,
}

/// Event attribute as sent by the node. CometBFT 0.34 and older encode
/// keys and values in base64.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    #[serde(default, deserialize_with = "str_or_num")]
    pub key: String,
    #[serde(default, deserialize_with = "str_or_num")]
    pub value: String,
}

impl Event {
    /// Value of the attribute named `key`, decoded from base64 when the
    /// node encoded it
    pub fn attribute(&self, key: &str) -> Option<String> {
        self.attributes.iter().find_map(|attr| {
            if attr.key == key {
                return Some(attr.value.clone());
            }
            match decode_text(&attr.key) {
                Some(decoded) if decoded == key => {
                    Some(decode_text(&attr.value).unwrap_or_else(|| attr.value.clone()))
                }
                _ => None,
            }
        })
    }
}

fn decode_text(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

/// Outcome of submitting a transaction
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BroadcastResult {
    /// Uppercase hex transaction hash
    pub hash: String,
    /// Inclusion height, zero if the transaction was not waited for
    pub height: u64,
    pub check_tx: AbciResponse,
    pub deliver_tx: Option<AbciResponse>,
    /// Events emitted during execution
    pub events: Vec<Event>,
}

#[derive(Deserialize)]
struct SyncResult {
    #[serde(flatten)]
    response: AbciResponse,
    #[serde(default)]
    hash: String,
}

#[derive(Deserialize)]
struct CommitResult {
    #[serde(default)]
    check_tx: AbciResponse,
    #[serde(default, alias = "tx_result")]
    deliver_tx: Option<AbciResponse>,
    #[serde(default)]
    hash: String,
    #[serde(default, deserialize_with = "str_or_num")]
    height: u64,
}

#[derive(Deserialize)]
struct TxResult {
    #[serde(default)]
    hash: String,
    #[serde(default, deserialize_with = "str_or_num")]
    height: u64,
    tx_result: AbciResponse,
}

impl BroadcastResult {
    /// Parse a `broadcast_tx_sync` or `broadcast_tx_async` result
    pub fn from_sync(value: Value) -> Result<Self> {
        let sync: SyncResult = serde_json::from_value(value)?;
        Ok(Self {
            hash: sync.hash,
            height: 0,
            check_tx: sync.response,
            deliver_tx: None,
            events: Vec::new(),
        })
    }

    /// Parse a `broadcast_tx_commit` result
    pub fn from_commit(value: Value) -> Result<Self> {
        let commit: CommitResult = serde_json::from_value(value)?;
        let events = commit
            .deliver_tx
            .as_ref()
            .map(|deliver| deliver.events.clone())
            .unwrap_or_default();
        Ok(Self {
            hash: commit.hash,
            height: commit.height,
            check_tx: commit.check_tx,
            deliver_tx: commit.deliver_tx,
            events,
        })
    }

    /// Parse a `tx` lookup result. CheckTx is implied to have passed.
    pub fn from_tx(value: Value) -> Result<Self> {
        Self::default().with_tx(value)
    }

    /// Attach the execution result from a `tx` lookup
    pub fn with_tx(mut self, value: Value) -> Result<Self> {
        let tx: TxResult = serde_json::from_value(value)?;
        if self.hash.is_empty() {
            self.hash = tx.hash;
        }
        self.height = tx.height;
        self.events = tx.tx_result.events.clone();
        self.deliver_tx = Some(tx.tx_result);
        Ok(self)
    }

    pub fn is_success(&self) -> bool {
        self.check_tx.is_ok() && self.deliver_tx.as_ref().map_or(true, AbciResponse::is_ok)
    }

    pub fn find_event(&self, kind: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.kind == kind)
    }
}

/// Fail with the first nonzero code, CheckTx before DeliverTx
pub fn assert_success(result: &BroadcastResult) -> Result<()> {
    if !result.check_tx.is_ok() {
        return Err(ClientError::ChainExecution {
            code: result.check_tx.code,
            log: result.check_tx.log.clone(),
        });
    }
    if let Some(deliver) = &result.deliver_tx {
        if !deliver.is_ok() {
            return Err(ClientError::ChainExecution {
                code: deliver.code,
                log: deliver.log.clone(),
            });
        }
    }
    Ok(())
}

/// Attribute `key` of the first event of type `kind`
pub fn find_attribute(result: &BroadcastResult, kind: &str, key: &str) -> Option<String> {
    result
        .events
        .iter()
        .filter(|event| event.kind == kind)
        .find_map(|event| event.attribute(key))
}

/// Shortest delay the polling helpers sleep between polls
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Options for the polling helpers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitOptions {
    /// Delay between polls
    pub interval: Duration,
    /// Upper bound on the total wait
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
        }
    }
}

impl WaitOptions {
    /// Delay actually slept between polls, never below [`MIN_POLL_INTERVAL`]
    pub fn poll_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }

    /// `None` when the timeout is too large to express as an instant
    fn deadline(&self) -> Option<Instant> {
        Instant::now().checked_add(self.timeout)
    }
}

fn passed(deadline: Option<Instant>, after: Duration) -> bool {
    match deadline {
        Some(deadline) => Instant::now()
            .checked_add(after)
            .map_or(true, |at| at > deadline),
        None => false,
    }
}

/// How `sign_and_broadcast` waits for a transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BroadcastOptions {
    /// Wait for CheckTx
    pub check_tx: bool,
    /// Wait for the transaction to be included in a block
    pub deliver_tx: bool,
    /// Use `broadcast_tx_commit` instead of sync broadcast plus polling
    pub use_legacy_broadcast_tx_commit: bool,
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for BroadcastOptions {
    fn default() -> Self {
        Self {
            check_tx: true,
            deliver_tx: true,
            use_legacy_broadcast_tx_commit: false,
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl BroadcastOptions {
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            interval: self.poll_interval,
            timeout: self.timeout,
        }
    }
}

pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await
}

/// Wait until wall clock time reaches `target`
///
/// Fails immediately with `Timeout` if `target` lies further away than the
/// timeout allows.
pub async fn wait_until(target: DateTime<Utc>, options: WaitOptions) -> Result<()> {
    let remaining = (target - Utc::now()).to_std().unwrap_or(Duration::ZERO);
    if remaining > options.timeout {
        return Err(ClientError::Timeout(options.timeout));
    }

    let deadline = options.deadline();
    while Utc::now() < target {
        if passed(deadline, Duration::ZERO) {
            return Err(ClientError::Timeout(options.timeout));
        }
        sleep(options.poll_interval()).await;
    }
    Ok(())
}

/// Poll `tx` until the transaction is found or the timeout expires
pub async fn wait_for_tx(rpc: &RpcClient, hash: &str, options: WaitOptions) -> Result<Value> {
    let deadline = options.deadline();
    let interval = options.poll_interval();
    loop {
        match rpc.tx(hash).await {
            Ok(tx) => return Ok(tx),
            Err(e) if e.is_not_found() => {
                debug!(%hash, "transaction not yet included");
            }
            Err(e) => return Err(e),
        }

        if passed(deadline, interval) {
            return Err(ClientError::Timeout(options.timeout));
        }
        sleep(interval).await;
    }
}
