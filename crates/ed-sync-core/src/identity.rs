use ed_api_types::AccountId;
use ed_chain_client::{SyncError, SyncResult, WalletProvider};

use crate::resolver::ProviderResolver;

/// "The current user": first account the wallet exposes. Never cached, the
/// wallet may switch accounts between calls.
pub struct IdentityAccessor<P> {
    provider: ProviderResolver<P>,
}

impl<P: WalletProvider + 'static> IdentityAccessor<P> {
    pub fn new(provider: ProviderResolver<P>) -> Self {
        Self { provider }
    }

    pub async fn current_account(&self) -> SyncResult<AccountId> {
        let provider = self.provider.provider().await?;
        provider
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(SyncError::NoAccountAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ALICE, BOB, MockChain, MockProvider, account};
    use std::rc::Rc;

    #[tokio::test]
    async fn first_account_is_current_and_refetched() -> anyhow::Result<()> {
        let chain = Rc::new(MockChain::with_accounts(&[ALICE, BOB]));
        let handle = chain.clone();
        let identity = IdentityAccessor::new(ProviderResolver::new(async move {
            Ok::<_, SyncError>(MockProvider(handle))
        }));

        assert_eq!(identity.current_account().await?, account(ALICE));

        chain.set_accounts(&[BOB]);
        assert_eq!(identity.current_account().await?, account(BOB));
        Ok(())
    }

    #[tokio::test]
    async fn locked_wallet_has_no_account() {
        let chain = Rc::new(MockChain::with_accounts(&[]));
        let identity = IdentityAccessor::new(ProviderResolver::new(async move {
            Ok::<_, SyncError>(MockProvider(chain))
        }));

        assert_eq!(
            identity.current_account().await.unwrap_err(),
            SyncError::NoAccountAvailable
        );
    }
}
