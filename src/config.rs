//! Client configuration for the marketplace contract and its ledger endpoint
use std::time::Duration;

/// Default inclusion fee, in stroops.
pub const BASE_FEE: u32 = 100;
/// Default transaction validity window in seconds.
pub const DEFAULT_TX_TIMEOUT_SECS: u32 = 30;
/// Interval between transaction status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Poll attempts before the pipeline gives up with a timeout.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 30;

const TESTNET_RPC_URL: &str = "https://soroban-testnet.stellar.org";
const TESTNET_NETWORK_ID: &str = "Test SDF Network ; September 2015";
const TESTNET_CONTRACT_ID: &str = "CDMAWTJWFQER7J2JRTJBTQHHUT3AICVAVDJGLJTE3RMIMMW5UDCRVCHX";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub rpc_url: String,
    /// Network identifier mixed into every transaction so an envelope signed
    /// for one network cannot be replayed on another.
    pub network_id: String,
    pub contract_id: String,
    pub base_fee: u32,
    pub tx_timeout_secs: u32,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
}

impl ClientConfig {
    pub fn new(rpc_url: &str, network_id: &str, contract_id: &str) -> Self {
        Self {
            rpc_url: rpc_url.to_string(),
            network_id: network_id.to_string(),
            contract_id: contract_id.to_string(),
            base_fee: BASE_FEE,
            tx_timeout_secs: DEFAULT_TX_TIMEOUT_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }

    /// The marketplace deployment on the public test network.
    pub fn testnet() -> Self {
        Self::new(TESTNET_RPC_URL, TESTNET_NETWORK_ID, TESTNET_CONTRACT_ID)
    }

    pub fn set_base_fee(mut self, fee: u32) -> Self {
        self.base_fee = fee;
        self
    }
    pub fn set_tx_timeout_secs(mut self, secs: u32) -> Self {
        self.tx_timeout_secs = secs;
        self
    }
    pub fn set_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
    pub fn set_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }
}
