//! Injected EIP-1193 wallet (`window.ethereum`) as an [`RpcTransport`].

use async_trait::async_trait;
use ed_chain_client::{SyncError, SyncResult};
use ed_chain_evm::{JsonRpcProvider, RpcError, RpcTransport, SubscriptionRouter};
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use serde_json::{Value, json};
use std::rc::Rc;
use tracing::{info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

pub struct InjectedTransport {
    ethereum: JsValue,
}

impl InjectedTransport {
    pub fn detect() -> SyncResult<Self> {
        let ethereum = Reflect::get(&crate::dom::window(), &JsValue::from_str("ethereum"))
            .unwrap_or(JsValue::UNDEFINED);
        if ethereum.is_undefined() || ethereum.is_null() {
            return Err(SyncError::ProviderUnavailable(
                "no injected wallet provider found".to_owned(),
            ));
        }
        Ok(Self { ethereum })
    }

    fn method(&self, name: &str) -> Result<Function, RpcError> {
        Reflect::get(&self.ethereum, &JsValue::from_str(name))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| RpcError::new(RpcError::INTERNAL, format!("provider has no {name}()")))
    }

    /// Feeds provider `message` events into `router` and fails every open
    /// stream on `disconnect`.
    pub fn listen(&self, router: Rc<SubscriptionRouter>) -> Result<(), RpcError> {
        let on = self.method("on")?;

        let messages = router.clone();
        let on_message = Closure::wrap(Box::new(move |message: JsValue| {
            match serde_wasm_bindgen::from_value::<Value>(message) {
                Ok(value) => {
                    messages.dispatch(&value);
                }
                Err(err) => warn!("unreadable provider message: {err}"),
            }
        }) as Box<dyn FnMut(JsValue)>);
        on.call2(
            &self.ethereum,
            &JsValue::from_str("message"),
            on_message.as_ref().unchecked_ref(),
        )
        .map_err(js_error)?;
        on_message.forget();

        let on_disconnect = Closure::wrap(Box::new(move |error: JsValue| {
            let err = js_error(error);
            warn!(code = err.code, "wallet provider disconnected");
            router.fail_all(&err.message);
        }) as Box<dyn FnMut(JsValue)>);
        on.call2(
            &self.ethereum,
            &JsValue::from_str("disconnect"),
            on_disconnect.as_ref().unchecked_ref(),
        )
        .map_err(js_error)?;
        on_disconnect.forget();
        Ok(())
    }
}

#[async_trait(?Send)]
impl RpcTransport for InjectedTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let args = json!({ "method": method, "params": params })
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|err| RpcError::new(RpcError::INTERNAL, err.to_string()))?;
        let promise = self
            .method("request")?
            .call1(&self.ethereum, &args)
            .map_err(js_error)?
            .dyn_into::<Promise>()
            .map_err(|_| RpcError::new(RpcError::INTERNAL, "request() did not return a promise"))?;
        let result = JsFuture::from(promise).await.map_err(js_error)?;
        if result.is_undefined() {
            return Ok(Value::Null);
        }
        serde_wasm_bindgen::from_value(result)
            .map_err(|err| RpcError::new(RpcError::INTERNAL, err.to_string()))
    }
}

/// Provider errors are `{ code, message }` objects; anything else is internal.
fn js_error(value: JsValue) -> RpcError {
    let field = |name: &str| Reflect::get(&value, &JsValue::from_str(name)).ok();
    let code = field("code")
        .and_then(|c| c.as_f64())
        .map(|c| c as i64)
        .unwrap_or(RpcError::INTERNAL);
    let message = field("message")
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| "unknown provider error".to_owned());
    RpcError::new(code, message)
}

/// Bootstrap for the provider resolver: detect the wallet, route its
/// notifications, then ask for account access.
pub async fn connect() -> SyncResult<JsonRpcProvider<InjectedTransport>> {
    let transport = InjectedTransport::detect()?;
    let router = Rc::new(SubscriptionRouter::default());
    transport
        .listen(router.clone())
        .map_err(|err| SyncError::ProviderUnavailable(err.to_string()))?;
    let provider = JsonRpcProvider::new(transport, router);
    let accounts = provider.request_accounts().await?;
    info!(accounts = accounts.len(), "wallet granted account access");
    Ok(provider)
}
