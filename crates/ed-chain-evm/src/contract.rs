use async_trait::async_trait;
use ed_api_types::{AccountId, ContractAddress, TxHash};
use ed_chain_client::{EntityContract, SyncError, SyncResult};
use std::rc::Rc;
use tracing::{debug, info};

use crate::abi;
use crate::artifact::ContractArtifact;
use crate::rpc::{JsonRpcProvider, RpcError, RpcTransport};

pub const GETTER: &str = "ownerToEntity";
pub const SETTER: &str = "updateEntityData";

/// The deployed entity contract, bound to one provider and one address.
pub struct EntityRegistry<T> {
    provider: Rc<JsonRpcProvider<T>>,
    address: ContractAddress,
    getter: [u8; 4],
    setter: [u8; 4],
}

impl<T: RpcTransport> EntityRegistry<T> {
    /// Resolves the instance the artifact records for the provider's network
    /// and checks that code actually lives there.
    pub async fn bind_deployed(
        provider: Rc<JsonRpcProvider<T>>,
        artifact: &ContractArtifact,
    ) -> SyncResult<Self> {
        let getter = artifact
            .expect_function(GETTER, &["address"], &["string"])?
            .signature();
        let setter = artifact.expect_function(SETTER, &["string"], &[])?.signature();

        let network_id = provider
            .network_id()
            .await
            .map_err(|err| SyncError::ContractResolutionFailed(format!("network lookup: {err}")))?;
        let address = artifact.deployed_address(&network_id)?;

        let code = provider
            .get_code(&address)
            .await
            .map_err(|err| SyncError::ContractResolutionFailed(format!("code lookup: {err}")))?;
        if code.is_empty() {
            return Err(SyncError::ContractResolutionFailed(format!(
                "no contract code at {address}"
            )));
        }

        info!(
            contract = %artifact.contract_name,
            network = %network_id,
            %address,
            "initiated contract instance"
        );

        Ok(Self {
            provider,
            address,
            getter: abi::selector(&getter),
            setter: abi::selector(&setter),
        })
    }

    pub fn address(&self) -> &ContractAddress {
        &self.address
    }
}

#[async_trait(?Send)]
impl<T: RpcTransport> EntityContract for EntityRegistry<T> {
    async fn owner_to_entity(&self, owner: &AccountId) -> SyncResult<String> {
        let data = abi::calldata(self.getter, &abi::encode_address(&owner.0));

        let output = self
            .provider
            .call(&self.address, &data)
            .await
            .map_err(rejected)?;
        abi::decode_string(&output).map_err(|err| SyncError::ChainCallRejected(format!("{GETTER}: {err}")))
    }

    async fn update_entity_data(&self, data: &str, from: &AccountId) -> SyncResult<TxHash> {
        let calldata = abi::calldata(self.setter, &abi::encode_string(data));
        let tx_hash = self
            .provider
            .send_transaction(from, &self.address, &calldata)
            .await
            .map_err(rejected)?;
        debug!(%tx_hash, %from, "entity update submitted");
        Ok(tx_hash)
    }
}

fn rejected(err: RpcError) -> SyncError {
    if err.is_user_rejection() {
        SyncError::ChainCallRejected("user denied transaction signature".to_owned())
    } else {
        SyncError::ChainCallRejected(err.to_string())
    }
}
