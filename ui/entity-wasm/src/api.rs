//! Fetches the compiled contract artifact served next to the page.

use ed_chain_client::{SyncError, SyncResult};
use ed_chain_evm::ContractArtifact;
use gloo_net::http::Request;
use tracing::debug;

pub async fn fetch_artifact(url: &str) -> SyncResult<ContractArtifact> {
    let unreachable = |reason: String| SyncError::ContractResolutionFailed(format!("fetch {url}: {reason}"));

    let resp = Request::get(url)
        .send()
        .await
        .map_err(|err| unreachable(err.to_string()))?;
    if !resp.ok() {
        return Err(unreachable(format!("{} {}", resp.status(), resp.status_text())));
    }
    let body = resp.text().await.map_err(|err| unreachable(err.to_string()))?;
    debug!(url, bytes = body.len(), "contract artifact fetched");
    ContractArtifact::from_json(&body)
}
