pub mod monitor;
pub mod price;
pub mod wallet;
pub use monitor::{MonitorConfig, MonitorOutcome, PriceMonitor};
pub use price::{PriceFeed, SimulatedDeepBook};
pub use wallet::{CoinRef, SimulatedWallet, WalletClient, WithdrawalReceipt};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("{service} failed: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },

    #[error("gave up after {0} consecutive poll failures")]
    RetriesExhausted(usize),
}
