//! Static display parameters served to browsers.

use bitcoin::Network;
use serde::{Deserialize, Serialize};

/// Subsidy halving interval on mainnet.
pub const MAINNET_HALVENING: u64 = 210_000;

/// Subsidy halving interval on regtest.
pub const REGTEST_HALVENING: u64 = 150;

/// Difficulty retarget period, used by the client for its cyclic display.
pub const RETARGET_INTERVAL: u64 = 2016;

/// Display constants for the chain being followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkParams {
    pub halvening: u64,
    pub treeinterval: u64,
}

impl NetworkParams {
    #[must_use]
    pub fn for_network(network: Network) -> Self {
        let halvening = match network {
            Network::Regtest => REGTEST_HALVENING,
            _ => MAINNET_HALVENING,
        };
        Self {
            halvening,
            treeinterval: RETARGET_INTERVAL,
        }
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::for_network(Network::Bitcoin)
    }
}
