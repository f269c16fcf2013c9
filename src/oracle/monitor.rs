use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::oracle::price::PriceFeed;
use crate::oracle::wallet::{WalletClient, WithdrawalReceipt};
use crate::oracle::OracleError;

#[derive(Clone, Copy, Debug)]
pub struct MonitorConfig {
    /// Withdrawal triggers strictly below this price.
    pub price_threshold: f64,
    pub poll_interval: Duration,
    /// Longer sleep after a failed poll.
    pub error_backoff: Duration,
    pub max_consecutive_errors: usize,
    /// Optional cap on polls; `None` runs until a terminal outcome.
    pub max_polls: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            price_threshold: 1.80,
            poll_interval: Duration::from_secs(10),
            error_backoff: Duration::from_secs(30),
            max_consecutive_errors: 5,
            max_polls: None,
        }
    }
}

/// Why the monitor stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MonitorOutcome {
    Withdrawn(WithdrawalReceipt),
    NothingToWithdraw,
    PollBudgetExhausted,
}

/// Sequential price watcher guarding a shared wallet. Polls the feed, and on
/// a threshold breach moves every held coin to the safe address through the
/// wallet client. Feed and client failures are retried with a longer backoff
/// against a bounded consecutive-error budget.
pub struct PriceMonitor<F: PriceFeed, W: WalletClient> {
    feed: F,
    wallet: W,
    config: MonitorConfig,
}

impl<F: PriceFeed, W: WalletClient> PriceMonitor<F, W> {
    pub fn new(feed: F, wallet: W, config: MonitorConfig) -> Self {
        Self {
            feed,
            wallet,
            config,
        }
    }

    pub fn wallet_mut(&mut self) -> &mut W {
        &mut self.wallet
    }

    pub fn run(
        &mut self,
        shared_wallet_id: &str,
        safe_address: &str,
    ) -> Result<MonitorOutcome, OracleError> {
        info!("price monitor online");
        info!("  shared wallet: {shared_wallet_id}");
        info!("  safe address:  {safe_address}");
        info!("  trigger:       < {:.2}", self.config.price_threshold);
        let mut polls = 0u64;
        let mut consecutive_errors = 0usize;
        loop {
            if let Some(limit) = self.config.max_polls {
                if polls >= limit {
                    return Ok(MonitorOutcome::PollBudgetExhausted);
                }
            }
            polls += 1;
            match self.poll_once(shared_wallet_id, safe_address) {
                Ok(Some(outcome)) => return Ok(outcome),
                Ok(None) => {
                    consecutive_errors = 0;
                    thread::sleep(self.config.poll_interval);
                }
                Err(err) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        warn!("monitor giving up: {err}");
                        return Err(OracleError::RetriesExhausted(consecutive_errors));
                    }
                    warn!("poll failed ({err}); backing off");
                    thread::sleep(self.config.error_backoff);
                }
            }
        }
    }

    fn poll_once(
        &mut self,
        shared_wallet_id: &str,
        safe_address: &str,
    ) -> Result<Option<MonitorOutcome>, OracleError> {
        let price = self.feed.current_price()?;
        info!("SUI/USDC price: {price:.4}");
        if price >= self.config.price_threshold {
            return Ok(None);
        }
        warn!(
            "price {price:.4} crossed {:.2}; starting emergency withdrawal",
            self.config.price_threshold
        );
        let coins = self.wallet.list_coins(shared_wallet_id)?;
        if coins.is_empty() {
            info!("shared wallet holds no coins; nothing to move");
            return Ok(Some(MonitorOutcome::NothingToWithdraw));
        }
        info!("{} coins found; preparing withdrawal", coins.len());
        let receipt = self
            .wallet
            .emergency_withdraw(shared_wallet_id, &coins, safe_address)?;
        info!("emergency withdrawal executed: {}", receipt.digest);
        Ok(Some(MonitorOutcome::Withdrawn(receipt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::wallet::{CoinRef, SimulatedWallet};

    struct FixedFeed(f64);
    impl PriceFeed for FixedFeed {
        fn current_price(&mut self) -> Result<f64, OracleError> {
            Ok(self.0)
        }
    }

    struct FailingFeed;
    impl PriceFeed for FailingFeed {
        fn current_price(&mut self) -> Result<f64, OracleError> {
            Err(OracleError::ExternalService {
                service: "deepbook",
                message: "rpc timeout".into(),
            })
        }
    }

    fn fast_config() -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::ZERO,
            error_backoff: Duration::ZERO,
            ..MonitorConfig::default()
        }
    }

    fn funded_wallet() -> SimulatedWallet {
        SimulatedWallet::with_coins(vec![CoinRef {
            object_id: "0xc01".into(),
            balance_mist: 9_000_000,
        }])
    }

    #[test]
    fn breach_with_coins_withdraws_and_terminates() {
        let mut monitor = PriceMonitor::new(FixedFeed(1.75), funded_wallet(), fast_config());
        let outcome = monitor.run("0xwallet", "0xsafe").unwrap();
        match outcome {
            MonitorOutcome::Withdrawn(receipt) => assert_eq!(receipt.coins_moved, 1),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(monitor.wallet_mut().coin_count(), 0);
    }

    #[test]
    fn breach_with_empty_wallet_ends_the_demo() {
        let mut monitor = PriceMonitor::new(FixedFeed(1.75), SimulatedWallet::empty(), fast_config());
        assert_eq!(
            monitor.run("0xwallet", "0xsafe").unwrap(),
            MonitorOutcome::NothingToWithdraw
        );
    }

    #[test]
    fn calm_prices_exhaust_the_poll_budget_without_touching_the_wallet() {
        let config = MonitorConfig {
            max_polls: Some(3),
            ..fast_config()
        };
        let mut monitor = PriceMonitor::new(FixedFeed(2.0), funded_wallet(), config);
        assert_eq!(
            monitor.run("0xwallet", "0xsafe").unwrap(),
            MonitorOutcome::PollBudgetExhausted
        );
        assert_eq!(monitor.wallet_mut().coin_count(), 1);
    }

    #[test]
    fn feed_failures_consume_the_retry_budget() {
        let mut monitor = PriceMonitor::new(FailingFeed, funded_wallet(), fast_config());
        assert!(matches!(
            monitor.run("0xwallet", "0xsafe"),
            Err(OracleError::RetriesExhausted(5))
        ));
    }
}
