//! Global controller handle.
//!
//! WASM is single-threaded, so the controller lives in a `thread_local!` and
//! event closures look it up instead of capturing it.

use ed_chain_evm::{EntityRegistry, JsonRpcProvider};
use ed_sync_core::SyncController;
use std::cell::RefCell;
use std::rc::Rc;

use crate::eip1193::InjectedTransport;
use crate::render::DomView;

pub type Provider = JsonRpcProvider<InjectedTransport>;
pub type Contract = EntityRegistry<InjectedTransport>;
pub type Controller = SyncController<Provider, Contract, DomView>;

thread_local! {
    static CONTROLLER: RefCell<Option<Rc<Controller>>> = const { RefCell::new(None) };
}

pub fn install(controller: Rc<Controller>) {
    CONTROLLER.with(|c| *c.borrow_mut() = Some(controller));
}

pub fn controller() -> Option<Rc<Controller>> {
    CONTROLLER.with(|c| c.borrow().clone())
}
