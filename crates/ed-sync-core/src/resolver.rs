//! Exactly-once shared resolutions for the provider handle and the contract
//! instance. Every caller awaits the same future; its result, success or
//! failure, is cached for the life of the process.

use ed_chain_client::SyncResult;
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::future::Future;
use std::rc::Rc;
use tracing::{info, warn};

type SharedResolution<T> = Shared<LocalBoxFuture<'static, SyncResult<Rc<T>>>>;

pub struct ProviderResolver<P> {
    shared: SharedResolution<P>,
}

impl<P> Clone for ProviderResolver<P> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<P: 'static> ProviderResolver<P> {
    /// `bootstrap` does not run until the first caller awaits [`Self::provider`].
    pub fn new<F>(bootstrap: F) -> Self
    where
        F: Future<Output = SyncResult<P>> + 'static,
    {
        let shared = async move {
            match bootstrap.await {
                Ok(provider) => {
                    info!("wallet provider connected");
                    Ok(Rc::new(provider))
                }
                Err(err) => {
                    warn!("wallet provider bootstrap failed: {err}");
                    Err(err)
                }
            }
        }
        .boxed_local()
        .shared();
        Self { shared }
    }

    pub async fn provider(&self) -> SyncResult<Rc<P>> {
        self.shared.clone().await
    }
}

pub struct ContractBinding<C> {
    shared: SharedResolution<C>,
}

impl<C> Clone for ContractBinding<C> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<C: 'static> ContractBinding<C> {
    /// `bind` receives the resolved provider; a provider failure is handed
    /// through unchanged without calling it.
    pub fn new<P, F, Fut>(provider: &ProviderResolver<P>, bind: F) -> Self
    where
        P: 'static,
        F: FnOnce(Rc<P>) -> Fut + 'static,
        Fut: Future<Output = SyncResult<C>> + 'static,
    {
        let provider = provider.clone();
        let shared = async move {
            let handle = provider.provider().await?;
            match bind(handle).await {
                Ok(contract) => Ok(Rc::new(contract)),
                Err(err) => {
                    warn!("contract resolution failed: {err}");
                    Err(err)
                }
            }
        }
        .boxed_local()
        .shared();
        Self { shared }
    }

    pub async fn contract(&self) -> SyncResult<Rc<C>> {
        self.shared.clone().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed_chain_client::SyncError;
    use std::cell::Cell;

    #[tokio::test]
    async fn bootstrap_runs_once_for_concurrent_waiters() -> anyhow::Result<()> {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let resolver = ProviderResolver::new(async move {
            counter.set(counter.get() + 1);
            Ok::<_, SyncError>("provider")
        });
        assert_eq!(runs.get(), 0);

        let other = resolver.clone();
        let (a, b, c) = futures::join!(resolver.provider(), other.provider(), resolver.provider());
        assert!(Rc::ptr_eq(&a?, &b?));
        assert_eq!(*c?, "provider");
        assert_eq!(runs.get(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn failure_is_cached_not_retried() {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let resolver = ProviderResolver::<&str>::new(async move {
            counter.set(counter.get() + 1);
            Err(SyncError::ProviderUnavailable("user declined".into()))
        });

        for _ in 0..3 {
            assert_eq!(
                resolver.provider().await.unwrap_err(),
                SyncError::ProviderUnavailable("user declined".into())
            );
        }
        assert_eq!(runs.get(), 1);
    }

    #[tokio::test]
    async fn contract_binds_against_resolved_provider() -> anyhow::Result<()> {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let provider = ProviderResolver::new(async { Ok::<_, SyncError>(7_u32) });
        let binding = ContractBinding::new(&provider, move |handle: Rc<u32>| async move {
            counter.set(counter.get() + 1);
            Ok::<_, SyncError>(format!("instance@{handle}"))
        });

        assert_eq!(*binding.contract().await?, "instance@7");
        assert_eq!(*binding.clone().contract().await?, "instance@7");
        assert_eq!(runs.get(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn provider_failure_skips_binding() {
        let provider = ProviderResolver::<u32>::new(async {
            Err(SyncError::ProviderUnavailable("no injected wallet provider found".into()))
        });
        let binding = ContractBinding::new(&provider, |_: Rc<u32>| async {
            Err::<String, _>(SyncError::ContractResolutionFailed("unreachable".into()))
        });

        assert!(matches!(
            binding.contract().await,
            Err(SyncError::ProviderUnavailable(_))
        ));
    }
}
