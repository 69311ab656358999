//! In-memory chain used by the unit tests. Writes sit in a pending pool until
//! [`MockChain::mine`] settles them and notifies every head subscriber.

use async_trait::async_trait;
use ed_api_types::{AccountId, BlockHeader, Notice, SubscriptionId, TxHash};
use ed_chain_client::{
    BlockSubscription, EntityContract, HeadEvent, SyncError, SyncResult, WalletProvider,
};
use futures::channel::mpsc::{self, UnboundedSender};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::controller::{SyncView, ViewState};

pub(crate) const ALICE: &str = "0x627306090abaB3A6e1400e9345bC60c78a8BEf57";
pub(crate) const BOB: &str = "0xf17f52151EbEF6C7334FAD080c5704D77216b732";

pub(crate) fn account(address: &str) -> AccountId {
    address.parse().expect("test address")
}

#[derive(Default)]
pub(crate) struct MockChain {
    accounts: RefCell<Vec<AccountId>>,
    records: RefCell<HashMap<AccountId, String>>,
    pool: RefCell<Vec<(AccountId, String)>>,
    pub(crate) writes: RefCell<Vec<(AccountId, String)>>,
    pub(crate) reject_writes: Cell<bool>,
    heads: RefCell<HashMap<SubscriptionId, UnboundedSender<HeadEvent>>>,
    next_subscription: Cell<u32>,
    pub(crate) unsubscribed: RefCell<Vec<SubscriptionId>>,
}

impl MockChain {
    pub(crate) fn with_accounts(accounts: &[&str]) -> Self {
        let chain = Self::default();
        chain.set_accounts(accounts);
        chain
    }

    pub(crate) fn set_accounts(&self, accounts: &[&str]) {
        *self.accounts.borrow_mut() = accounts.iter().map(|a| account(a)).collect();
    }

    pub(crate) fn set_record(&self, owner: &str, value: &str) {
        self.records
            .borrow_mut()
            .insert(account(owner), value.to_owned());
    }

    pub(crate) fn live_subscriptions(&self) -> usize {
        self.heads.borrow().len()
    }

    /// Settles the pending pool and announces a new block.
    pub(crate) fn mine(&self, number: u64) {
        for (owner, value) in self.pool.borrow_mut().drain(..) {
            self.records.borrow_mut().insert(owner, value);
        }
        for tx in self.heads.borrow().values() {
            let _ = tx.unbounded_send(Ok(BlockHeader { number, hash: None }));
        }
    }

    /// Closes every head stream without announcing a block.
    pub(crate) fn drop_subscriptions(&self) {
        self.heads.borrow_mut().clear();
    }

    pub(crate) fn stream_error(&self, reason: &str) {
        for tx in self.heads.borrow().values() {
            let _ = tx.unbounded_send(Err(SyncError::SubscriptionError(reason.to_owned())));
        }
    }
}

pub(crate) struct MockProvider(pub(crate) Rc<MockChain>);

#[async_trait(?Send)]
impl WalletProvider for MockProvider {
    async fn accounts(&self) -> SyncResult<Vec<AccountId>> {
        Ok(self.0.accounts.borrow().clone())
    }

    async fn subscribe_new_heads(&self) -> SyncResult<BlockSubscription> {
        let n = self.0.next_subscription.get() + 1;
        self.0.next_subscription.set(n);
        let id = SubscriptionId(format!("0x{n:x}"));
        let (tx, events) = mpsc::unbounded();
        self.0.heads.borrow_mut().insert(id.clone(), tx);
        Ok(BlockSubscription { id, events })
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> SyncResult<()> {
        self.0.heads.borrow_mut().remove(id);
        self.0.unsubscribed.borrow_mut().push(id.clone());
        Ok(())
    }
}

pub(crate) struct MockContract(pub(crate) Rc<MockChain>);

#[async_trait(?Send)]
impl EntityContract for MockContract {
    async fn owner_to_entity(&self, owner: &AccountId) -> SyncResult<String> {
        Ok(self.0.records.borrow().get(owner).cloned().unwrap_or_default())
    }

    async fn update_entity_data(&self, data: &str, from: &AccountId) -> SyncResult<TxHash> {
        if self.0.reject_writes.get() {
            return Err(SyncError::ChainCallRejected(
                "user denied transaction signature".to_owned(),
            ));
        }
        self.0.writes.borrow_mut().push((from.clone(), data.to_owned()));
        self.0.pool.borrow_mut().push((from.clone(), data.to_owned()));
        Ok(TxHash(format!("0xtx{}", self.0.writes.borrow().len())))
    }
}

#[derive(Default)]
pub(crate) struct RecordingView {
    pub(crate) renders: RefCell<Vec<ViewState>>,
    pub(crate) notices: RefCell<Vec<Notice>>,
}

impl RecordingView {
    pub(crate) fn notice_titles(&self) -> Vec<String> {
        self.notices.borrow().iter().map(|n| n.title.clone()).collect()
    }
}

impl SyncView for RecordingView {
    fn render(&self, state: &ViewState) {
        self.renders.borrow_mut().push(state.clone());
    }

    fn notify(&self, notice: &Notice) {
        self.notices.borrow_mut().push(notice.clone());
    }
}
