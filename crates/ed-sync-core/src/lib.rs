pub mod controller;
pub mod identity;
pub mod resolver;

#[cfg(test)]
mod testing;

pub use controller::{
    Confirmation, PendingConfirmation, SaveOutcome, SyncController, SyncPhase, SyncView, ViewState,
};
pub use identity::IdentityAccessor;
pub use resolver::{ContractBinding, ProviderResolver};
