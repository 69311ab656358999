//! JSON-RPC provider over a pluggable transport.
//!
//! The transport only knows how to send `{ method, params }` and hand back the
//! result; in the browser that is EIP-1193 `request`. Push notifications for
//! `eth_subscribe` arrive out of band and are fed to the [`SubscriptionRouter`].

use async_trait::async_trait;
use ed_api_types::{AccountId, BlockHeader, ContractAddress, SubscriptionId, TxHash};
use ed_chain_client::{BlockSubscription, HeadEvent, SyncError, SyncResult, WalletProvider};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::abi;

/// JSON-RPC / EIP-1193 error object.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("rpc error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNAUTHORIZED: i64 = 4100;
    pub const DISCONNECTED: i64 = 4900;
    pub const INTERNAL: i64 = -32603;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn malformed(what: &str, value: &Value) -> Self {
        Self::new(Self::INTERNAL, format!("malformed {what}: {value}"))
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Self::USER_REJECTED
    }
}

#[async_trait(?Send)]
pub trait RpcTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

/// Routes subscription notifications to the stream opened for their id.
#[derive(Default)]
pub struct SubscriptionRouter {
    routes: RefCell<HashMap<SubscriptionId, UnboundedSender<HeadEvent>>>,
}

impl SubscriptionRouter {
    pub fn register(&self, id: &SubscriptionId) -> UnboundedReceiver<HeadEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.routes.borrow_mut().insert(id.clone(), tx);
        rx
    }

    /// Drops the sender so the subscriber's stream ends.
    pub fn remove(&self, id: &SubscriptionId) -> bool {
        self.routes.borrow_mut().remove(id).is_some()
    }

    pub fn active(&self) -> usize {
        self.routes.borrow().len()
    }

    /// Accepts both the EIP-1193 `message` shape
    /// (`{ type, data: { subscription, result } }`) and a raw JSON-RPC
    /// notification (`{ method, params: { subscription, result } }`).
    /// Returns whether the message matched a live subscription.
    pub fn dispatch(&self, message: &Value) -> bool {
        let body = match (message.get("type"), message.get("method")) {
            (Some(kind), _) if kind == "eth_subscription" => message.get("data"),
            (_, Some(method)) if method == "eth_subscription" => message.get("params"),
            _ => None,
        };
        let Some(body) = body else {
            return false;
        };
        let Some(id) = body.get("subscription").and_then(Value::as_str) else {
            return false;
        };

        let routes = self.routes.borrow();
        let Some(tx) = routes.get(&SubscriptionId(id.to_owned())) else {
            debug!(subscription = id, "notification for unknown subscription");
            return false;
        };

        let event = body
            .get("result")
            .and_then(parse_header)
            .ok_or_else(|| SyncError::SubscriptionError(format!("malformed block header: {body}")));
        tx.unbounded_send(event).is_ok()
    }

    /// Reports a stream-level error (e.g. provider disconnect) to every
    /// subscriber, then closes all streams.
    pub fn fail_all(&self, reason: &str) {
        for (_, tx) in self.routes.borrow_mut().drain() {
            let _ = tx.unbounded_send(Err(SyncError::SubscriptionError(reason.to_owned())));
        }
    }
}

fn parse_header(value: &Value) -> Option<BlockHeader> {
    let number = parse_quantity(value.get("number")?.as_str()?)?;
    let hash = value.get("hash").and_then(Value::as_str).map(str::to_owned);
    Some(BlockHeader { number, hash })
}

pub fn parse_quantity(raw: &str) -> Option<u64> {
    let digits = raw.strip_prefix("0x")?;
    u64::from_str_radix(digits, 16).ok()
}

pub struct JsonRpcProvider<T> {
    transport: T,
    router: Rc<SubscriptionRouter>,
}

impl<T: RpcTransport> JsonRpcProvider<T> {
    pub fn new(transport: T, router: Rc<SubscriptionRouter>) -> Self {
        Self { transport, router }
    }

    pub fn router(&self) -> &Rc<SubscriptionRouter> {
        &self.router
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        debug!(method, "rpc request");
        self.transport.request(method, params).await
    }

    /// Asks the wallet to expose accounts to this page (connection prompt).
    pub async fn request_accounts(&self) -> SyncResult<Vec<AccountId>> {
        let value = self
            .request("eth_requestAccounts", json!([]))
            .await
            .map_err(|err| {
                if err.is_user_rejection() {
                    SyncError::ProviderUnavailable("user declined wallet connection".to_owned())
                } else {
                    SyncError::ProviderUnavailable(err.to_string())
                }
            })?;
        parse_accounts(&value).map_err(|err| SyncError::ProviderUnavailable(err.to_string()))
    }

    pub async fn network_id(&self) -> Result<String, RpcError> {
        let value = self.request("net_version", json!([])).await?;
        match &value {
            Value::String(id) => Ok(id.clone()),
            Value::Number(id) => Ok(id.to_string()),
            other => Err(RpcError::malformed("net_version result", other)),
        }
    }

    pub async fn get_code(&self, address: &ContractAddress) -> Result<Vec<u8>, RpcError> {
        let value = self
            .request("eth_getCode", json!([address.to_string(), "latest"]))
            .await?;
        hex_bytes("eth_getCode result", &value)
    }

    pub async fn call(&self, to: &ContractAddress, data: &[u8]) -> Result<Vec<u8>, RpcError> {
        let value = self
            .request(
                "eth_call",
                json!([{ "to": to.to_string(), "data": abi::encode_hex(data) }, "latest"]),
            )
            .await?;
        hex_bytes("eth_call result", &value)
    }

    pub async fn send_transaction(
        &self,
        from: &AccountId,
        to: &ContractAddress,
        data: &[u8],
    ) -> Result<TxHash, RpcError> {
        let value = self
            .request(
                "eth_sendTransaction",
                json!([{ "from": from.to_string(), "to": to.to_string(), "data": abi::encode_hex(data) }]),
            )
            .await?;
        value
            .as_str()
            .map(|hash| TxHash(hash.to_owned()))
            .ok_or_else(|| RpcError::malformed("transaction hash", &value))
    }
}

#[async_trait(?Send)]
impl<T: RpcTransport> WalletProvider for JsonRpcProvider<T> {
    async fn accounts(&self) -> SyncResult<Vec<AccountId>> {
        let value = self
            .request("eth_accounts", json!([]))
            .await
            .map_err(|err| SyncError::ProviderUnavailable(err.to_string()))?;
        parse_accounts(&value).map_err(|err| SyncError::ProviderUnavailable(err.to_string()))
    }

    async fn subscribe_new_heads(&self) -> SyncResult<BlockSubscription> {
        let value = self
            .request("eth_subscribe", json!(["newHeads"]))
            .await
            .map_err(|err| SyncError::SubscriptionError(err.to_string()))?;
        let id = value
            .as_str()
            .map(|id| SubscriptionId(id.to_owned()))
            .ok_or_else(|| SyncError::SubscriptionError(format!("malformed subscription id: {value}")))?;

        let events = self.router.register(&id);
        debug!(subscription = %id, "subscribed to newHeads");
        Ok(BlockSubscription { id, events })
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> SyncResult<()> {
        self.router.remove(id);
        match self.request("eth_unsubscribe", json!([id.0])).await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!(subscription = %id, "eth_unsubscribe failed: {err}");
                Err(SyncError::SubscriptionError(err.to_string()))
            }
        }
    }
}

fn parse_accounts(value: &Value) -> Result<Vec<AccountId>, RpcError> {
    let list = value
        .as_array()
        .ok_or_else(|| RpcError::malformed("account list", value))?;
    list.iter()
        .map(|entry| {
            entry
                .as_str()
                .and_then(|addr| addr.parse().ok())
                .ok_or_else(|| RpcError::malformed("account address", entry))
        })
        .collect()
}

fn hex_bytes(what: &str, value: &Value) -> Result<Vec<u8>, RpcError> {
    let raw = value.as_str().ok_or_else(|| RpcError::malformed(what, value))?;
    abi::decode_hex(raw).map_err(|_| RpcError::malformed(what, value))
}
