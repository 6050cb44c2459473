//! Contract deployment check: an address is deployed iff it has bytecode.

use crate::client::EvmClient;
use alloy_primitives::Address;
use serde::Serialize;
use tracing::{debug, warn};

/// Whether a configured contract has code on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeploymentStatus {
    pub address: Address,
    pub has_code: bool,
}

#[derive(Clone)]
pub struct DeploymentChecker {
    client: EvmClient,
}

impl DeploymentChecker {
    pub fn new(client: EvmClient) -> Self {
        Self { client }
    }

    /// True iff `eth_getCode` returns non-empty bytecode. RPC failures count as not deployed.
    pub async fn is_deployed(&self, address: Address) -> bool {
        match self.client.get_code(address).await {
            Ok(code) => {
                debug!(%address, code_len = code.len(), "Deployment check");
                !code.is_empty()
            }
            Err(e) => {
                warn!(%address, error = %e, "Deployment check failed");
                false
            }
        }
    }

    /// Check every address, in order.
    pub async fn check_all(&self, addresses: &[Address]) -> Vec<DeploymentStatus> {
        let mut statuses = Vec::with_capacity(addresses.len());
        for &address in addresses {
            statuses.push(DeploymentStatus {
                address,
                has_code: self.is_deployed(address).await,
            });
        }
        statuses
    }
}
