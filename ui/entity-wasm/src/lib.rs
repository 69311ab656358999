//! EntityDesk WASM frontend.
//!
//! Binds the entity card to the sync controller: the injected wallet provides
//! accounts and block heads, and the contract artifact served next to the page
//! locates the deployed registry.

pub mod api;
pub mod config;
pub mod dom;
pub mod eip1193;
pub mod events;
pub mod logging;
pub mod notify;
pub mod render;
pub mod state;

use ed_chain_evm::EntityRegistry;
use ed_sync_core::{ContractBinding, ProviderResolver, SyncController};
use std::rc::Rc;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;

/// WASM entry point, called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;
    let config = config::AppConfig::load(&els.app_root);
    logging::init(&config.log_filter);
    info!(artifact = %config.artifact_url, "starting entity desk");

    let provider = ProviderResolver::new(eip1193::connect());
    let artifact_url = config.artifact_url;
    let contract = ContractBinding::new(&provider, move |handle| async move {
        let artifact = api::fetch_artifact(&artifact_url).await?;
        EntityRegistry::bind_deployed(handle, &artifact).await
    });

    let controller = Rc::new(SyncController::new(
        provider,
        contract,
        render::DomView::new(els.clone()),
    ));
    state::install(controller.clone());
    events::bind_events(&els)?;

    // A failed mount is already on screen as the error panel.
    if let Err(err) = controller.mount().await {
        warn!("mount failed: {err}");
    }
    Ok(())
}
