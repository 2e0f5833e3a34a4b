//! Read-only chain client

use crate::broadcast::{wait_for_tx, BroadcastOptions, BroadcastResult};
use crate::rpc::{BroadcastMode, HttpEndpoint, RpcClient};
use crate::{ClientError, Result};
use cosmlink_log::{debug, info};
use cosmlink_math::Coin;
use cosmlink_types::proto::tx_hash;
use cosmlink_types::{
    BaseAccount, QueryAccountRequest, QueryAccountResponse, QueryBalanceRequest,
    QueryBalanceResponse,
};
use std::sync::Arc;
use tokio::sync::OnceCell;

const ACCOUNT_QUERY: &str = "/cosmos.auth.v1beta1.Query/Account";
const BALANCE_QUERY: &str = "/cosmos.bank.v1beta1.Query/Balance";

/// Queries chain state and submits already signed transactions
#[derive(Debug, Clone)]
pub struct StargateClient {
    rpc: Arc<RpcClient>,
    chain_id: Arc<OnceCell<String>>,
}

impl StargateClient {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self {
            rpc,
            chain_id: Arc::new(OnceCell::new()),
        }
    }

    /// Open a client and resolve the chain id
    pub async fn connect(endpoint: impl Into<HttpEndpoint>) -> Result<Self> {
        let client = Self::new(Arc::new(RpcClient::new(endpoint)?));
        client.chain_id().await?;
        Ok(client)
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Chain id reported by the node, fetched once
    pub async fn chain_id(&self) -> Result<String> {
        let chain_id = self
            .chain_id
            .get_or_try_init(|| async {
                let status = self.rpc.status().await?;
                debug!(chain_id = %status.node_info.network, "resolved chain id");
                Ok::<_, ClientError>(status.node_info.network)
            })
            .await?;
        Ok(chain_id.clone())
    }

    pub async fn get_height(&self) -> Result<u64> {
        Ok(self.rpc.status().await?.sync_info.latest_block_height)
    }

    /// Account number and sequence for `address`
    pub async fn query_account(&self, address: &str) -> Result<BaseAccount> {
        let request = QueryAccountRequest {
            address: address.to_string(),
        };
        let response: QueryAccountResponse = match self.rpc.query_proto(ACCOUNT_QUERY, &request).await {
            Ok(response) => response,
            Err(e) if e.is_not_found() => {
                return Err(ClientError::AccountNotFound(address.to_string()))
            }
            Err(e) => return Err(e),
        };

        let any = response
            .account
            .ok_or_else(|| ClientError::AccountNotFound(address.to_string()))?;
        Ok(BaseAccount::from_any(&any)?)
    }

    /// Balance of `denom`; zero if the account holds none
    pub async fn get_balance(&self, address: &str, denom: &str) -> Result<Coin> {
        let request = QueryBalanceRequest {
            address: address.to_string(),
            denom: denom.to_string(),
        };
        let response: QueryBalanceResponse = self.rpc.query_proto(BALANCE_QUERY, &request).await?;
        match response.balance {
            Some(balance) => Ok(balance),
            None => Ok(Coin::new(denom, "0")?),
        }
    }

    /// Submit signed transaction bytes and wait as `options` asks
    pub async fn broadcast_tx(
        &self,
        tx_bytes: &[u8],
        options: &BroadcastOptions,
    ) -> Result<BroadcastResult> {
        let result = self.submit_tx(tx_bytes, options).await?;
        self.confirm_tx(result, options).await
    }

    /// Hand the transaction to the node without waiting for a block
    ///
    /// Sync broadcasts return once CheckTx has run; only the legacy commit
    /// mode blocks until inclusion.
    pub async fn submit_tx(
        &self,
        tx_bytes: &[u8],
        options: &BroadcastOptions,
    ) -> Result<BroadcastResult> {
        let hash = tx_hash(tx_bytes);
        info!(%hash, size = tx_bytes.len(), "broadcasting transaction");

        if !options.check_tx && !options.deliver_tx {
            let value = self.rpc.broadcast(tx_bytes, BroadcastMode::Async).await?;
            return with_hash(BroadcastResult::from_sync(value)?, hash);
        }

        if options.deliver_tx && options.use_legacy_broadcast_tx_commit {
            let value = self.rpc.broadcast(tx_bytes, BroadcastMode::Commit).await?;
            return with_hash(BroadcastResult::from_commit(value)?, hash);
        }

        let value = self.rpc.broadcast(tx_bytes, BroadcastMode::Sync).await?;
        with_hash(BroadcastResult::from_sync(value)?, hash)
    }

    /// Poll for inclusion of a submitted transaction when `options` asks for it
    pub async fn confirm_tx(
        &self,
        result: BroadcastResult,
        options: &BroadcastOptions,
    ) -> Result<BroadcastResult> {
        let waited = options.use_legacy_broadcast_tx_commit || result.deliver_tx.is_some();
        if !options.deliver_tx || waited || !result.check_tx.is_ok() {
            return Ok(result);
        }

        let tx = wait_for_tx(&self.rpc, &result.hash, options.wait_options()).await?;
        let result = result.with_tx(tx)?;
        info!(hash = %result.hash, height = result.height, "transaction included");
        Ok(result)
    }
}

fn with_hash(mut result: BroadcastResult, hash: String) -> Result<BroadcastResult> {
    if result.hash.is_empty() {
        result.hash = hash;
    } else if !result.hash.eq_ignore_ascii_case(&hash) {
        return Err(ClientError::InvalidResponse(format!(
            "node reported hash {} for transaction {hash}",
            result.hash
        )));
    }
    Ok(result)
}
