//! EVM implementation of the chain surface: ABI codec, contract artifacts,
//! a JSON-RPC provider and the entity contract binding.

pub mod abi;
pub mod artifact;
pub mod contract;
pub mod rpc;

pub use artifact::ContractArtifact;
pub use contract::EntityRegistry;
pub use rpc::{JsonRpcProvider, RpcError, RpcTransport, SubscriptionRouter};
