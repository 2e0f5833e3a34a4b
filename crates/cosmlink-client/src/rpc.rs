//! CometBFT JSON-RPC transport

use crate::de::str_or_num;
use crate::{ClientError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cosmlink_log::debug;
use prost::Message;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Node URL plus extra headers sent with every request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpEndpoint {
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl HttpEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

impl From<&str> for HttpEndpoint {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for HttpEndpoint {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// How long `broadcast` waits before returning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastMode {
    /// Return immediately
    Async,
    /// Return after CheckTx
    Sync,
    /// Return after the block is committed
    Commit,
}

impl BroadcastMode {
    pub fn method(self) -> &'static str {
        match self {
            BroadcastMode::Async => "broadcast_tx_async",
            BroadcastMode::Sync => "broadcast_tx_sync",
            BroadcastMode::Commit => "broadcast_tx_commit",
        }
    }
}

/// JSON content type first; endpoint headers replace it rather than repeat it
fn request_headers(endpoint: &HttpEndpoint) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in &endpoint.headers {
        let invalid = |reason: String| ClientError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.insert(header, value);
    }
    Ok(headers)
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    id: u64,
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<RpcErrorBody> for ClientError {
    fn from(error: RpcErrorBody) -> Self {
        let data = match error.data {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        ClientError::Rpc {
            code: error.code,
            message: error.message,
            data,
        }
    }
}

#[derive(Deserialize, Default)]
struct AbciQueryResponse {
    #[serde(default, deserialize_with = "str_or_num")]
    code: u32,
    #[serde(default)]
    log: String,
    #[serde(default)]
    value: Option<String>,
}

/// Node status information
#[derive(Deserialize, Debug, Clone)]
pub struct NodeStatus {
    pub node_info: NodeInfo,
    pub sync_info: SyncInfo,
}

/// Node information
#[derive(Deserialize, Debug, Clone)]
pub struct NodeInfo {
    /// Chain id
    pub network: String,
    #[serde(default)]
    pub moniker: String,
    #[serde(default)]
    pub version: String,
}

/// Sync information
#[derive(Deserialize, Debug, Clone)]
pub struct SyncInfo {
    #[serde(deserialize_with = "str_or_num")]
    pub latest_block_height: u64,
    #[serde(default)]
    pub latest_block_time: String,
    #[serde(default)]
    pub catching_up: bool,
}

/// JSON-RPC client for a single CometBFT node
///
/// Request ids increase monotonically per client. There are no retries and
/// no reconnection logic; every call is a single HTTP POST.
#[derive(Debug)]
pub struct RpcClient {
    http: HttpClient,
    url: Url,
    endpoint: HttpEndpoint,
    headers: HeaderMap,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<HttpEndpoint>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<HttpEndpoint>, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.into();
        let url = Url::parse(&endpoint.url)?;
        let headers = request_headers(&endpoint)?;
        let http = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            url,
            endpoint,
            headers,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &HttpEndpoint {
        &self.endpoint
    }

    /// Send a raw JSON-RPC request and return its `result`
    pub async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest {
            id,
            jsonrpc: "2.0",
            method,
            params,
        };
        debug!(id, method, url = %self.url, "rpc request");

        let response = self
            .http
            .post(self.url.clone())
            .headers(self.headers.clone())
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // CometBFT reports some JSON-RPC errors with a 500 status
            if let Ok(RpcResponse {
                error: Some(error), ..
            }) = serde_json::from_str::<RpcResponse>(&body)
            {
                return Err(error.into());
            }
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let response: RpcResponse = serde_json::from_str(&body)?;
        if let Some(error) = response.error {
            return Err(error.into());
        }
        response
            .result
            .ok_or_else(|| ClientError::InvalidResponse("missing result field".to_string()))
    }

    /// ABCI query returning the raw response value
    pub async fn query(&self, path: &str, data: &[u8]) -> Result<Vec<u8>> {
        let params = json!({
            "data": hex::encode(data),
            "path": path,
            "prove": false,
        });
        let result = self.call("abci_query", params).await?;

        let response: AbciQueryResponse = match result.get("response") {
            Some(response) => serde_json::from_value(response.clone()).map_err(|e| {
                ClientError::InvalidResponse(format!("malformed abci_query response: {e}"))
            })?,
            None => AbciQueryResponse::default(),
        };
        if response.code != 0 {
            return Err(ClientError::Chain(response.log));
        }

        match response.value.as_deref().map(|v| STANDARD.decode(v)) {
            Some(Ok(value)) => Ok(value),
            _ => Err(ClientError::Chain(response.log)),
        }
    }

    /// Query a gRPC-style service method, e.g.
    /// `request("cosmos.bank.v1beta1.Query", "Balance", bytes)`
    pub async fn request(&self, service: &str, method: &str, data: &[u8]) -> Result<Vec<u8>> {
        self.query(&format!("/{service}/{method}"), data).await
    }

    /// Typed ABCI query
    pub async fn query_proto<Req, Res>(&self, path: &str, request: &Req) -> Result<Res>
    where
        Req: Message,
        Res: Message + Default,
    {
        let bytes = self.query(path, &request.encode_to_vec()).await?;
        Ok(Res::decode(bytes.as_slice())?)
    }

    /// Submit encoded transaction bytes
    pub async fn broadcast(&self, tx_bytes: &[u8], mode: BroadcastMode) -> Result<Value> {
        let params = json!({ "tx": STANDARD.encode(tx_bytes) });
        self.call(mode.method(), params).await
    }

    pub async fn status(&self) -> Result<NodeStatus> {
        let result = self.call("status", json!({})).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Look up a committed transaction by its uppercase hex hash
    pub async fn tx(&self, hash: &str) -> Result<Value> {
        let hash_bytes = hex::decode(hash)
            .map_err(|e| ClientError::InvalidResponse(format!("invalid tx hash {hash}: {e}")))?;
        let params = json!({
            "hash": STANDARD.encode(hash_bytes),
            "prove": false,
        });
        self.call("tx", params).await
    }
}
