//! Truffle-style contract build artifacts.

use ed_api_types::ContractAddress;
use ed_chain_client::{SyncError, SyncResult};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub abi: Vec<AbiEntry>,
    #[serde(default)]
    pub networks: HashMap<String, NetworkDeployment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbiEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
    #[serde(default)]
    pub outputs: Vec<AbiParam>,
    #[serde(default)]
    pub state_mutability: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDeployment {
    pub address: String,
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

impl ContractArtifact {
    pub fn from_json(raw: &str) -> SyncResult<Self> {
        serde_json::from_str(raw).map_err(|err| {
            SyncError::ContractResolutionFailed(format!("malformed contract artifact: {err}"))
        })
    }

    pub fn function(&self, name: &str) -> Option<&AbiEntry> {
        self.abi
            .iter()
            .find(|entry| entry.kind == "function" && entry.name.as_deref() == Some(name))
    }

    /// Finds `name` and checks its input and output types.
    pub fn expect_function(
        &self,
        name: &str,
        inputs: &[&str],
        outputs: &[&str],
    ) -> SyncResult<&AbiEntry> {
        let entry = self.function(name).ok_or_else(|| {
            SyncError::ContractResolutionFailed(format!(
                "{} does not expose {name}",
                self.contract_name
            ))
        })?;

        let actual_inputs: Vec<&str> = entry.inputs.iter().map(|p| p.kind.as_str()).collect();
        let actual_outputs: Vec<&str> = entry.outputs.iter().map(|p| p.kind.as_str()).collect();
        if actual_inputs != inputs || actual_outputs != outputs {
            return Err(SyncError::ContractResolutionFailed(format!(
                "{}.{name} has signature ({}) -> ({}), expected ({}) -> ({})",
                self.contract_name,
                actual_inputs.join(","),
                actual_outputs.join(","),
                inputs.join(","),
                outputs.join(","),
            )));
        }

        Ok(entry)
    }

    pub fn deployed_address(&self, network_id: &str) -> SyncResult<ContractAddress> {
        let deployment = self.networks.get(network_id).ok_or_else(|| {
            SyncError::ContractResolutionFailed(format!(
                "{} has not been deployed to detected network {network_id}",
                self.contract_name
            ))
        })?;
        deployment.address.parse().map_err(|err| {
            SyncError::ContractResolutionFailed(format!(
                "{} address {:?} on network {network_id}: {err}",
                self.contract_name, deployment.address
            ))
        })
    }
}

impl AbiEntry {
    /// Canonical signature used for selector hashing, e.g. `updateEntityData(string)`.
    pub fn signature(&self) -> String {
        let inputs: Vec<&str> = self.inputs.iter().map(|p| p.kind.as_str()).collect();
        format!("{}({})", self.name.as_deref().unwrap_or_default(), inputs.join(","))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const DEVICE_MANAGER_ARTIFACT: &str = r#"{
        "contractName": "DeviceManager",
        "abi": [
            {
                "type": "function",
                "name": "ownerToEntity",
                "inputs": [{ "name": "", "type": "address" }],
                "outputs": [{ "name": "", "type": "string" }],
                "stateMutability": "view"
            },
            {
                "type": "function",
                "name": "updateEntityData",
                "inputs": [{ "name": "_data", "type": "string" }],
                "outputs": [],
                "stateMutability": "nonpayable"
            },
            { "type": "event", "name": "EntityUpdated", "inputs": [] }
        ],
        "networks": {
            "5777": { "address": "0x5b1869D9A4C187F2EAa108f3062412ecf0526b24" }
        }
    }"#;

    #[test]
    fn parses_and_finds_functions() {
        let artifact = ContractArtifact::from_json(DEVICE_MANAGER_ARTIFACT).unwrap();
        assert_eq!(artifact.contract_name, "DeviceManager");

        let getter = artifact
            .expect_function("ownerToEntity", &["address"], &["string"])
            .unwrap();
        assert_eq!(getter.signature(), "ownerToEntity(address)");
        assert_eq!(getter.state_mutability.as_deref(), Some("view"));

        let setter = artifact
            .expect_function("updateEntityData", &["string"], &[])
            .unwrap();
        assert_eq!(setter.signature(), "updateEntityData(string)");
    }

    #[test]
    fn events_are_not_functions() {
        let artifact = ContractArtifact::from_json(DEVICE_MANAGER_ARTIFACT).unwrap();
        assert!(artifact.function("EntityUpdated").is_none());
    }

    #[test]
    fn mismatched_signature_is_resolution_failure() {
        let artifact = ContractArtifact::from_json(DEVICE_MANAGER_ARTIFACT).unwrap();
        let err = artifact
            .expect_function("ownerToEntity", &["uint256"], &["string"])
            .unwrap_err();
        assert!(matches!(err, SyncError::ContractResolutionFailed(_)));
    }

    #[test]
    fn address_lookup_by_network_id() {
        let artifact = ContractArtifact::from_json(DEVICE_MANAGER_ARTIFACT).unwrap();
        assert_eq!(
            artifact.deployed_address("5777").unwrap(),
            "0x5b1869d9a4c187f2eaa108f3062412ecf0526b24".parse().unwrap()
        );

        let err = artifact.deployed_address("1").unwrap_err();
        assert_eq!(
            err,
            SyncError::ContractResolutionFailed(
                "DeviceManager has not been deployed to detected network 1".to_owned()
            )
        );
    }

    #[test]
    fn malformed_deployed_address_is_resolution_failure() {
        let raw = DEVICE_MANAGER_ARTIFACT.replace("0x5b1869D9A4C187F2EAa108f3062412ecf0526b24", "0x5b18");
        let artifact = ContractArtifact::from_json(&raw).unwrap();
        assert!(matches!(
            artifact.deployed_address("5777"),
            Err(SyncError::ContractResolutionFailed(_))
        ));
    }

    #[test]
    fn malformed_json_is_resolution_failure() {
        let err = ContractArtifact::from_json("{ \"abi\": 3 }").unwrap_err();
        assert!(matches!(err, SyncError::ContractResolutionFailed(_)));
    }
}
