//! Account-state synchronization.
//!
//! Phases: `Initializing` → `Ready` → `Editing` → `Submitting` →
//! `AwaitingConfirmation` → `Ready`, with `Failed` reachable from any failing
//! transition. `display` only ever comes from a chain read, never from the
//! local draft.

use ed_api_types::{AccountId, BlockHeader, Notice, SubscriptionId, TxHash};
use ed_chain_client::{BlockSubscription, EntityContract, SyncError, SyncResult, WalletProvider};
use futures::StreamExt;
use std::cell::RefCell;
use std::mem;
use tracing::{debug, error, info, warn};

use crate::identity::IdentityAccessor;
use crate::resolver::{ContractBinding, ProviderResolver};

/// Rendering seam for the UI.
pub trait SyncView {
    fn render(&self, state: &ViewState);
    fn notify(&self, notice: &Notice);
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncPhase {
    Initializing,
    Ready { display: String },
    Editing { display: String, draft: String },
    Submitting { display: String, draft: String },
    AwaitingConfirmation { display: String, tx_hash: TxHash },
    Failed {
        reason: SyncError,
        last_display: Option<String>,
    },
}

impl SyncPhase {
    pub fn display(&self) -> Option<&str> {
        match self {
            SyncPhase::Initializing => None,
            SyncPhase::Ready { display }
            | SyncPhase::Editing { display, .. }
            | SyncPhase::Submitting { display, .. }
            | SyncPhase::AwaitingConfirmation { display, .. } => Some(display),
            SyncPhase::Failed { last_display, .. } => last_display.as_deref(),
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            SyncPhase::Editing { draft, .. } | SyncPhase::Submitting { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// True while a chain call is outstanding.
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            SyncPhase::Initializing
                | SyncPhase::Submitting { .. }
                | SyncPhase::AwaitingConfirmation { .. }
        )
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, SyncPhase::Editing { .. })
    }

    fn with_read(self, value: String) -> SyncPhase {
        match self {
            SyncPhase::Initializing
            | SyncPhase::Ready { .. }
            | SyncPhase::AwaitingConfirmation { .. } => SyncPhase::Ready { display: value },
            // Mid-edit drafts are left alone; a fresh toggle reseeds from `display`.
            SyncPhase::Editing { draft, .. } => SyncPhase::Editing {
                display: value,
                draft,
            },
            SyncPhase::Submitting { draft, .. } => SyncPhase::Submitting {
                display: value,
                draft,
            },
            SyncPhase::Failed { reason, .. } => SyncPhase::Failed {
                reason,
                last_display: Some(value),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub account: Option<AccountId>,
    pub phase: SyncPhase,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            account: None,
            phase: SyncPhase::Initializing,
        }
    }
}

/// A submitted write and the listener armed for it.
#[derive(Debug)]
pub struct PendingConfirmation {
    pub tx_hash: TxHash,
    subscription: Option<BlockSubscription>,
}

impl PendingConfirmation {
    pub fn subscription_id(&self) -> Option<&SubscriptionId> {
        self.subscription.as_ref().map(|s| &s.id)
    }
}

#[derive(Debug)]
pub enum SaveOutcome {
    /// Not editing; nothing to save.
    Ignored,
    /// Draft equals display; no chain write was issued.
    Unchanged,
    Submitted(PendingConfirmation),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed(BlockHeader),
    /// Listener was superseded or torn down before a block arrived.
    Cancelled,
}

/// The one listener allowed to confirm, and the write it belongs to.
struct ArmedListener {
    subscription: SubscriptionId,
    tx_hash: TxHash,
}

pub struct SyncController<P, C, V> {
    provider: ProviderResolver<P>,
    contract: ContractBinding<C>,
    identity: IdentityAccessor<P>,
    view: V,
    state: RefCell<ViewState>,
    pending: RefCell<Option<ArmedListener>>,
}

impl<P, C, V> SyncController<P, C, V>
where
    P: WalletProvider + 'static,
    C: EntityContract + 'static,
    V: SyncView,
{
    pub fn new(provider: ProviderResolver<P>, contract: ContractBinding<C>, view: V) -> Self {
        Self {
            identity: IdentityAccessor::new(provider.clone()),
            provider,
            contract,
            view,
            state: RefCell::new(ViewState::default()),
            pending: RefCell::new(None),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn pending_subscription(&self) -> Option<SubscriptionId> {
        self.pending.borrow().as_ref().map(|l| l.subscription.clone())
    }

    fn is_armed(&self, id: &SubscriptionId) -> bool {
        self.pending.borrow().as_ref().is_some_and(|l| &l.subscription == id)
    }

    /// Phase to fall back to when leaving the editor: still loading while a
    /// write is unconfirmed.
    fn settled(&self, display: String) -> SyncPhase {
        match self.pending.borrow().as_ref() {
            Some(listener) => SyncPhase::AwaitingConfirmation {
                display,
                tx_hash: listener.tx_hash.clone(),
            },
            None => SyncPhase::Ready { display },
        }
    }

    fn leave_awaiting(&self) {
        self.update(|s| {
            if let SyncPhase::AwaitingConfirmation { display, .. } = &s.phase {
                s.phase = SyncPhase::Ready {
                    display: display.clone(),
                };
            }
        });
    }

    fn update(&self, apply: impl FnOnce(&mut ViewState)) {
        apply(&mut self.state.borrow_mut());
        self.view.render(&self.state.borrow());
    }

    fn fail(&self, reason: SyncError) {
        self.update(|s| {
            let last_display = s.phase.display().map(str::to_owned);
            s.phase = SyncPhase::Failed {
                reason,
                last_display,
            };
        });
    }

    /// Resolves provider, contract and account, then performs the first read.
    /// Any failure leaves the view in `Failed`.
    pub async fn mount(&self) -> SyncResult<()> {
        self.update(|s| s.phase = SyncPhase::Initializing);
        let result = self.initialize().await;
        if let Err(err) = &result {
            error!("entity view failed to initialize: {err}");
            self.fail(err.clone());
        }
        result
    }

    async fn initialize(&self) -> SyncResult<()> {
        self.provider.provider().await?;
        self.contract.contract().await?;
        let account = self.identity.current_account().await?;
        self.update(|s| s.account = Some(account));
        self.refresh().await.map(|_| ())
    }

    /// Reads the current account's record into `display`.
    pub async fn refresh(&self) -> SyncResult<String> {
        match self.read_entity().await {
            Ok((account, value)) => {
                debug!(%account, "entity record refreshed");
                self.update(|s| {
                    s.account = Some(account);
                    let phase = mem::replace(&mut s.phase, SyncPhase::Initializing);
                    s.phase = phase.with_read(value.clone());
                });
                Ok(value)
            }
            Err(err) => {
                warn!("entity read failed: {err}");
                self.view.notify(&Notice::error(err.to_string()));
                self.leave_awaiting();
                Err(err)
            }
        }
    }

    async fn read_entity(&self) -> SyncResult<(AccountId, String)> {
        let contract = self.contract.contract().await?;
        let account = self.identity.current_account().await?;
        let value = contract.owner_to_entity(&account).await?;
        Ok((account, value))
    }

    /// Opens or closes the edit panel. Opening seeds the draft from `display`.
    pub fn toggle_edit(&self) {
        self.update(|s| {
            let phase = mem::replace(&mut s.phase, SyncPhase::Initializing);
            s.phase = match phase {
                SyncPhase::Ready { display }
                | SyncPhase::AwaitingConfirmation { display, .. } => SyncPhase::Editing {
                    draft: display.clone(),
                    display,
                },
                SyncPhase::Editing { display, .. } => self.settled(display),
                other => other,
            };
        });
    }

    pub fn edit_draft(&self, text: &str) {
        self.update(|s| {
            if let SyncPhase::Editing { draft, .. } = &mut s.phase {
                *draft = text.to_owned();
            }
        });
    }

    /// Submits the draft. Returns as soon as the transaction is in the pending
    /// pool and a confirmation listener is armed.
    pub async fn save(&self) -> SyncResult<SaveOutcome> {
        let (display, draft) = match &self.state.borrow().phase {
            SyncPhase::Editing { display, draft } => (display.clone(), draft.clone()),
            _ => return Ok(SaveOutcome::Ignored),
        };

        if draft == display {
            debug!("draft unchanged; skipping chain write");
            self.update(|s| s.phase = self.settled(display));
            return Ok(SaveOutcome::Unchanged);
        }

        self.update(|s| {
            s.phase = SyncPhase::Submitting {
                display: display.clone(),
                draft: draft.clone(),
            }
        });

        match self.submit(&draft).await {
            Ok(pending) => {
                self.view.notify(&Notice::info(
                    "Transaction sent",
                    "Once mined, your entity data will be updated.",
                ));
                let tx_hash = pending.tx_hash.clone();
                self.update(|s| {
                    let display = s.phase.display().map(str::to_owned).unwrap_or(display);
                    s.phase = SyncPhase::AwaitingConfirmation { display, tx_hash };
                });
                Ok(SaveOutcome::Submitted(pending))
            }
            Err(err) => {
                error!("entity update failed: {err}");
                self.view.notify(&Notice::error(err.to_string()));
                self.update(|s| {
                    let display = s.phase.display().map(str::to_owned).unwrap_or(display);
                    s.phase = SyncPhase::Editing { display, draft };
                });
                Err(err)
            }
        }
    }

    async fn submit(&self, draft: &str) -> SyncResult<PendingConfirmation> {
        let contract = self.contract.contract().await?;
        let account = self.identity.current_account().await?;
        let tx_hash = contract.update_entity_data(draft, &account).await?;
        info!(%tx_hash, %account, "entity update accepted into pending pool");

        let subscription = match self.arm_confirmation(&tx_hash).await {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                error!("could not arm confirmation listener: {err}");
                None
            }
        };
        Ok(PendingConfirmation {
            tx_hash,
            subscription,
        })
    }

    /// Subscribes to new heads, cancelling any listener still pending.
    async fn arm_confirmation(&self, tx_hash: &TxHash) -> SyncResult<BlockSubscription> {
        let provider = self.provider.provider().await?;
        let previous = self.pending.borrow_mut().take();
        if let Some(ArmedListener { subscription, .. }) = previous {
            debug!(%subscription, "superseding pending confirmation listener");
            if let Err(err) = provider.unsubscribe(&subscription).await {
                warn!(%subscription, "failed to cancel superseded listener: {err}");
            }
        }

        let subscription = provider.subscribe_new_heads().await?;
        *self.pending.borrow_mut() = Some(ArmedListener {
            subscription: subscription.id.clone(),
            tx_hash: tx_hash.clone(),
        });
        Ok(subscription)
    }

    /// Waits for the next block, then cancels the listener and re-reads.
    /// Stream errors are logged and the wait continues.
    pub async fn await_confirmation(&self, pending: PendingConfirmation) -> SyncResult<Confirmation> {
        let PendingConfirmation {
            tx_hash,
            subscription,
        } = pending;

        let Some(mut subscription) = subscription else {
            if self.pending.borrow().is_none() {
                self.leave_awaiting();
            }
            return Ok(Confirmation::Cancelled);
        };

        while let Some(event) = subscription.events.next().await {
            match event {
                // A block buffered before a newer save took over.
                Ok(_) if !self.is_armed(&subscription.id) => {
                    debug!(subscription = %subscription.id, "ignoring block for superseded listener");
                    return Ok(Confirmation::Cancelled);
                }
                Ok(header) => {
                    info!(block = header.number, %tx_hash, "block mined after entity update");
                    self.view.notify(&Notice::success(
                        "Transaction mined",
                        "Your entity data has been updated.",
                    ));
                    self.cancel(&subscription.id).await;
                    self.refresh().await?;
                    return Ok(Confirmation::Confirmed(header));
                }
                Err(err) => error!(subscription = %subscription.id, "{err}"),
            }
        }

        debug!(subscription = %subscription.id, "confirmation listener closed before a block arrived");
        // Still the armed listener: the provider closed it, not a newer save
        // or teardown, so nothing else will leave the loading state.
        if self.is_armed(&subscription.id) {
            self.pending.borrow_mut().take();
            self.leave_awaiting();
        }
        Ok(Confirmation::Cancelled)
    }

    /// `save` followed by `await_confirmation` when a write was submitted.
    pub async fn save_and_confirm(&self) -> SyncResult<()> {
        if let SaveOutcome::Submitted(pending) = self.save().await? {
            self.await_confirmation(pending).await?;
        }
        Ok(())
    }

    async fn cancel(&self, id: &SubscriptionId) {
        if self.is_armed(id) {
            self.pending.borrow_mut().take();
        }
        if let Ok(provider) = self.provider.provider().await {
            if let Err(err) = provider.unsubscribe(id).await {
                warn!(subscription = %id, "unsubscribe failed: {err}");
            }
        }
    }

    /// Cancels and clears the pending listener, if any.
    pub async fn teardown(&self) {
        let pending = self.pending.borrow_mut().take();
        if let Some(ArmedListener { subscription, .. }) = pending {
            debug!(%subscription, "tearing down confirmation listener");
            self.cancel(&subscription).await;
        }
    }
}
