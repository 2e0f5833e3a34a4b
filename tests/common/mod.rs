//! In-process CometBFT node backed by a toy account state machine

#![allow(dead_code)]

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cosmlink::codec::{default_registry, Any};
use cosmlink::crypto::{address_from_pubkey, Secp256k1Signer};
use cosmlink::math::Coin;
use cosmlink::types::proto::{
    mode_info_proto::Sum, tx_hash, AuthInfoProto, PubKeyProto, SignModeProto, TxBodyProto,
};
use cosmlink::types::{
    BaseAccount, Fee, QueryAccountRequest, QueryAccountResponse, QueryBalanceRequest,
    QueryBalanceResponse, SignDoc, SignDocProto, StdSignDoc, TxRaw,
};
use prost::Message;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const CHAIN_ID: &str = "testing";
pub const SECRET: &str = "1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e";

pub fn signer() -> Secp256k1Signer {
    Secp256k1Signer::from_hex(SECRET, "cosmos").unwrap()
}

#[derive(Default)]
struct ChainState {
    height: u64,
    accounts: HashMap<String, (u64, u64)>,
    balances: HashMap<(String, String), Coin>,
    txs: HashMap<String, Value>,
    tx_lookups: HashMap<String, usize>,
    hidden_lookups: usize,
    deliver_failure: Option<(u32, String)>,
    accepted_sequences: Vec<u64>,
    methods: Vec<String>,
}

/// Mock node that checks signatures and sequences like the auth ante handler
#[derive(Clone)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
    pub url: String,
}

impl MockChain {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(ChainState {
            height: 1,
            ..ChainState::default()
        }));
        let app = Router::new()
            .route("/", post(handle))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            url: format!("http://{addr}"),
        }
    }

    pub fn add_account(&self, address: &str, account_number: u64, sequence: u64) {
        let mut state = self.state.lock().unwrap();
        state
            .accounts
            .insert(address.to_string(), (account_number, sequence));
    }

    pub fn set_balance(&self, address: &str, coin: Coin) {
        let mut state = self.state.lock().unwrap();
        state
            .balances
            .insert((address.to_string(), coin.denom.clone()), coin);
    }

    /// Make DeliverTx fail for every following transaction
    pub fn fail_deliver(&self, code: u32, log: &str) {
        self.state.lock().unwrap().deliver_failure = Some((code, log.to_string()));
    }

    /// Number of `tx` lookups answered with "not found" before a committed
    /// transaction becomes visible
    pub fn hide_txs_for(&self, lookups: usize) {
        self.state.lock().unwrap().hidden_lookups = lookups;
    }

    pub fn sequence_of(&self, address: &str) -> u64 {
        self.state.lock().unwrap().accounts[address].1
    }

    /// Bump the on-chain sequence behind the client's back
    pub fn bump_sequence(&self, address: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(account) = state.accounts.get_mut(address) {
            account.1 += 1;
        }
    }

    pub fn accepted_sequences(&self) -> Vec<u64> {
        self.state.lock().unwrap().accepted_sequences.clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.state.lock().unwrap().methods.clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.methods().iter().filter(|m| *m == method).count()
    }
}

async fn handle(
    State(state): State<Arc<Mutex<ChainState>>>,
    Json(request): Json<Value>,
) -> Json<Value> {
    let mut state = state.lock().unwrap();
    let method = request["method"].as_str().unwrap_or_default().to_string();
    state.methods.push(method.clone());

    let outcome = match method.as_str() {
        "status" => Ok(json!({
            "node_info": { "network": CHAIN_ID, "moniker": "mock", "version": "0.38.0" },
            "sync_info": {
                "latest_block_height": state.height.to_string(),
                "latest_block_time": "2026-01-01T00:00:00Z",
                "catching_up": false
            }
        })),
        "abci_query" => Ok(state.query(&request["params"])),
        "broadcast_tx_async" | "broadcast_tx_sync" | "broadcast_tx_commit" => {
            Ok(state.broadcast(&method, &request["params"]))
        }
        "tx" => state.lookup(&request["params"]),
        other => Err(format!("method {other} not found")),
    };

    Json(match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }),
        Err(data) => json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "error": { "code": -32603, "message": "Internal error", "data": data }
        }),
    })
}

fn encoded(key: &str, value: &str) -> Value {
    json!({ "key": STANDARD.encode(key), "value": STANDARD.encode(value), "index": true })
}

impl ChainState {
    fn query(&self, params: &Value) -> Value {
        let data = hex::decode(params["data"].as_str().unwrap_or_default()).unwrap_or_default();
        let path = params["path"].as_str().unwrap_or_default();

        let answer = match path {
            "/cosmos.auth.v1beta1.Query/Account" => {
                let request = QueryAccountRequest::decode(data.as_slice()).unwrap();
                match self.accounts.get(&request.address) {
                    Some(&(account_number, sequence)) => {
                        let account = BaseAccount {
                            address: request.address.clone(),
                            pub_key: None,
                            account_number,
                            sequence,
                        };
                        Ok(QueryAccountResponse {
                            account: Some(Any::pack(&account)),
                        }
                        .encode_to_vec())
                    }
                    None => Err((
                        22,
                        format!(
                            "rpc error: code = NotFound desc = account {} not found: key not found",
                            request.address
                        ),
                    )),
                }
            }
            "/cosmos.bank.v1beta1.Query/Balance" => {
                let request = QueryBalanceRequest::decode(data.as_slice()).unwrap();
                let balance = self
                    .balances
                    .get(&(request.address, request.denom))
                    .cloned();
                Ok(QueryBalanceResponse { balance }.encode_to_vec())
            }
            other => Err((6, format!("unknown query path {other}"))),
        };

        match answer {
            Ok(value) => json!({
                "response": { "code": 0, "log": "", "value": STANDARD.encode(value), "height": self.height.to_string() }
            }),
            Err((code, log)) => json!({
                "response": { "code": code, "codespace": "sdk", "log": log, "value": null }
            }),
        }
    }

    fn broadcast(&mut self, method: &str, params: &Value) -> Value {
        let tx_bytes = STANDARD
            .decode(params["tx"].as_str().unwrap_or_default())
            .unwrap();
        let hash = tx_hash(&tx_bytes);
        let check = self.check_and_deliver(&hash, &tx_bytes);

        match (method, check) {
            ("broadcast_tx_commit", Ok(deliver)) => json!({
                "check_tx": { "code": 0, "log": "", "gas_wanted": "200000", "gas_used": "0" },
                "deliver_tx": deliver,
                "hash": hash,
                "height": self.height.to_string()
            }),
            ("broadcast_tx_commit", Err((code, log))) => json!({
                "check_tx": { "code": code, "log": log, "codespace": "sdk" },
                "deliver_tx": {},
                "hash": hash,
                "height": "0"
            }),
            (_, Ok(_)) => json!({ "code": 0, "data": "", "log": "[]", "codespace": "", "hash": hash }),
            (_, Err((code, log))) => {
                json!({ "code": code, "data": "", "log": log, "codespace": "sdk", "hash": hash })
            }
        }
    }

    /// CheckTx then, on success, immediately commit the transaction in a new
    /// block
    fn check_and_deliver(&mut self, hash: &str, tx_bytes: &[u8]) -> Result<Value, (u32, String)> {
        let raw = TxRaw::decode(tx_bytes).map_err(|e| (2, format!("tx parse error: {e}")))?;
        let body = TxBodyProto::decode(raw.body_bytes.as_slice()).map_err(|e| (2, e.to_string()))?;
        let auth_info =
            AuthInfoProto::decode(raw.auth_info_bytes.as_slice()).map_err(|e| (2, e.to_string()))?;

        let signer_info = auth_info.signer_infos.first().ok_or((4, "no signers".to_string()))?;
        let pub_key = signer_info
            .public_key
            .as_ref()
            .ok_or((4, "missing public key".to_string()))?;
        let key = PubKeyProto::decode(pub_key.value.as_slice())
            .map_err(|e| (4, e.to_string()))?
            .key;
        let address = address_from_pubkey("cosmos", &key).map_err(|e| (4, e.to_string()))?;

        let (account_number, sequence) = *self
            .accounts
            .get(&address)
            .ok_or((9, format!("account {address} not found")))?;
        if signer_info.sequence != sequence {
            return Err((
                32,
                format!(
                    "account sequence mismatch, expected {sequence}, got {}: incorrect account sequence",
                    signer_info.sequence
                ),
            ));
        }

        let mode = match signer_info.mode_info.as_ref().and_then(|m| m.sum.clone()) {
            Some(Sum::Single(single)) => single.mode,
            None => return Err((4, "missing mode info".to_string())),
        };
        let sign_doc = if mode == SignModeProto::Direct as i32 {
            SignDoc::Direct(SignDocProto {
                body_bytes: raw.body_bytes.clone(),
                auth_info_bytes: raw.auth_info_bytes.clone(),
                chain_id: CHAIN_ID.to_string(),
                account_number,
            })
        } else if mode == SignModeProto::LegacyAminoJson as i32 {
            amino_sign_doc(&body, &auth_info, account_number, sequence)?
        } else {
            return Err((18, format!("unsupported sign mode {mode}")));
        };

        let sign_bytes = sign_doc.sign_bytes().map_err(|e| (2, e.to_string()))?;
        let signature = raw.signatures.first().cloned().unwrap_or_default();
        if !Secp256k1Signer::verify(&key, &sign_bytes, &signature) {
            return Err((
                4,
                format!(
                    "signature verification failed; please verify account number ({account_number}) and chain-id ({CHAIN_ID}): unauthorized"
                ),
            ));
        }

        if let Some(account) = self.accounts.get_mut(&address) {
            account.1 += 1;
        }
        self.accepted_sequences.push(sequence);
        self.height += 1;

        let action = body
            .messages
            .first()
            .map(|m| m.type_url.clone())
            .unwrap_or_default();
        let events = json!([
            { "type": "message", "attributes": [encoded("action", &action), encoded("sender", &address)] },
            { "type": "tx", "attributes": [encoded("acc_seq", &format!("{address}/{sequence}"))] }
        ]);
        let deliver = match &self.deliver_failure {
            Some((code, log)) => json!({ "code": code, "log": log, "codespace": "sdk", "gas_used": "51234", "events": [] }),
            None => json!({ "code": 0, "log": "", "data": "", "gas_wanted": "200000", "gas_used": 61234, "events": events }),
        };

        self.txs.insert(
            hash.to_string(),
            json!({
                "hash": hash,
                "height": self.height.to_string(),
                "index": 0,
                "tx_result": deliver.clone(),
                "tx": STANDARD.encode(tx_bytes)
            }),
        );
        Ok(deliver)
    }

    fn lookup(&mut self, params: &Value) -> Result<Value, String> {
        let hash_bytes = STANDARD
            .decode(params["hash"].as_str().unwrap_or_default())
            .map_err(|e| e.to_string())?;
        let hash = hex::encode_upper(hash_bytes);

        let lookups = self.tx_lookups.entry(hash.clone()).or_insert(0);
        *lookups += 1;
        if *lookups <= self.hidden_lookups {
            return Err(format!("tx ({hash}) not found"));
        }
        self.txs
            .get(&hash)
            .cloned()
            .ok_or_else(|| format!("tx ({hash}) not found"))
    }
}

fn amino_sign_doc(
    body: &TxBodyProto,
    auth_info: &AuthInfoProto,
    account_number: u64,
    sequence: u64,
) -> Result<SignDoc, (u32, String)> {
    let registry = default_registry();
    let msgs = body
        .messages
        .iter()
        .map(|any| {
            let msg = registry.decode_any(any)?;
            registry.to_amino(&msg.type_url, msg.value.as_ref())
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| (2, e.to_string()))?;

    let fee = auth_info.fee.clone().unwrap_or_default();
    let fee = Fee {
        amount: fee.amount,
        gas_limit: fee.gas_limit,
        payer: fee.payer,
        granter: fee.granter,
    };

    Ok(SignDoc::Amino(StdSignDoc {
        account_number: account_number.to_string(),
        chain_id: CHAIN_ID.to_string(),
        fee: fee.to_std_fee(),
        memo: body.memo.clone(),
        msgs,
        sequence: sequence.to_string(),
        timeout_height: (body.timeout_height != 0).then(|| body.timeout_height.to_string()),
    }))
}
