//! Event binding.
//!
//! Handlers look the controller up in [`state`] so closures stay `'static`.
//! Async work goes through `wasm_bindgen_futures::spawn_local`.

use std::rc::Rc;
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::dom::{self, Elements};
use crate::state::{self, Controller};

/// Helper: attach an async handler that receives the controller.
macro_rules! on_async {
    ($target:expr, $event:literal, $handler:expr) => {{
        let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
            if let Some(controller) = state::controller() {
                wasm_bindgen_futures::spawn_local(async move {
                    $handler(controller).await;
                });
            }
        }) as Box<dyn FnMut(_)>);
        $target.add_event_listener_with_callback($event, cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Helper: attach a sync handler.
macro_rules! on {
    ($target:expr, $event:literal, $cb:expr) => {{
        let cb = Closure::wrap(Box::new($cb) as Box<dyn FnMut(web_sys::Event)>);
        $target.add_event_listener_with_callback($event, cb.as_ref().unchecked_ref())?;
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after the controller is installed.
pub fn bind_events(els: &Elements) -> Result<(), JsValue> {
    on!(els.edit_btn, "click", move |_| {
        if let Some(controller) = state::controller() {
            controller.toggle_edit();
        }
    });

    let draft = els.draft.clone();
    on!(els.draft, "input", move |_| {
        if let Some(controller) = state::controller() {
            controller.edit_draft(&draft.value());
        }
    });

    on_async!(els.save_btn, "click", on_save);
    on_async!(dom::window(), "pagehide", on_pagehide);
    Ok(())
}

async fn on_save(controller: Rc<Controller>) {
    // Failures were already surfaced as notices.
    if let Err(err) = controller.save_and_confirm().await {
        debug!("save finished with error: {err}");
    }
}

async fn on_pagehide(controller: Rc<Controller>) {
    controller.teardown().await;
}
