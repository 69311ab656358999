use async_trait::async_trait;
use ed_api_types::{AccountId, BlockHeader, SubscriptionId, TxHash};
use futures::channel::mpsc::UnboundedReceiver;
use thiserror::Error;

/// Failures of the account-state synchronization flow.
///
/// `Clone` because shared resolutions hand the same cached result to every waiter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("wallet provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("contract resolution failed: {0}")]
    ContractResolutionFailed(String),
    #[error("no account available; unlock or connect your wallet")]
    NoAccountAvailable,
    #[error("chain call rejected: {0}")]
    ChainCallRejected(String),
    #[error("block subscription error: {0}")]
    SubscriptionError(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Item carried by a block subscription stream.
pub type HeadEvent = SyncResult<BlockHeader>;

/// A live new-block subscription. The stream ends once the provider drops it
/// (after `unsubscribe`).
#[derive(Debug)]
pub struct BlockSubscription {
    pub id: SubscriptionId,
    pub events: UnboundedReceiver<HeadEvent>,
}

/// Wallet-connected network client.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Accounts the client currently exposes, in the wallet's preferred order.
    async fn accounts(&self) -> SyncResult<Vec<AccountId>>;
    async fn subscribe_new_heads(&self) -> SyncResult<BlockSubscription>;
    async fn unsubscribe(&self, id: &SubscriptionId) -> SyncResult<()>;
}

/// The deployed entity contract: one getter keyed by owner, one setter.
#[async_trait(?Send)]
pub trait EntityContract {
    async fn owner_to_entity(&self, owner: &AccountId) -> SyncResult<String>;

    /// Returns once the transaction is accepted into the pending pool, not once mined.
    async fn update_entity_data(&self, data: &str, from: &AccountId) -> SyncResult<TxHash>;
}
