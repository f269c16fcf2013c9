use sha2::{Digest, Sha256};

use crate::oracle::OracleError;

/// Gas ceiling the withdrawal transaction is submitted with, in MIST.
pub const GAS_BUDGET_MIST: u64 = 50_000_000;
/// Move entry point the withdrawal calls into.
pub const WITHDRAW_TARGET: &str = "shared_wallet::emergency_withdraw";

/// One coin object held by the shared wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinRef {
    pub object_id: String,
    pub balance_mist: u64,
}

/// Proof that a withdrawal transaction was executed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawalReceipt {
    pub digest: String,
    pub coins_moved: usize,
}

/// The subset of the chain client the oracle needs.
pub trait WalletClient {
    fn list_coins(&mut self, owner: &str) -> Result<Vec<CoinRef>, OracleError>;
    fn emergency_withdraw(
        &mut self,
        wallet_id: &str,
        coins: &[CoinRef],
        safe_address: &str,
    ) -> Result<WithdrawalReceipt, OracleError>;
}

/// In-memory wallet standing in for the real chain client. Withdrawing
/// drains the held coins and yields a digest derived from the call, so
/// repeated runs are reproducible.
pub struct SimulatedWallet {
    coins: Vec<CoinRef>,
}

impl SimulatedWallet {
    pub fn with_coins(coins: Vec<CoinRef>) -> Self {
        Self { coins }
    }

    pub fn empty() -> Self {
        Self { coins: Vec::new() }
    }

    pub fn coin_count(&self) -> usize {
        self.coins.len()
    }
}

impl WalletClient for SimulatedWallet {
    fn list_coins(&mut self, _owner: &str) -> Result<Vec<CoinRef>, OracleError> {
        Ok(self.coins.clone())
    }

    fn emergency_withdraw(
        &mut self,
        wallet_id: &str,
        coins: &[CoinRef],
        safe_address: &str,
    ) -> Result<WithdrawalReceipt, OracleError> {
        if coins.is_empty() {
            return Err(OracleError::ExternalService {
                service: "wallet",
                message: "cannot withdraw an empty coin vector".into(),
            });
        }
        let mut hasher = Sha256::new();
        hasher.update(WITHDRAW_TARGET.as_bytes());
        hasher.update(wallet_id.as_bytes());
        hasher.update(safe_address.as_bytes());
        hasher.update(GAS_BUDGET_MIST.to_le_bytes());
        for coin in coins {
            hasher.update(coin.object_id.as_bytes());
        }
        let digest = format!("0x{}", hex::encode(hasher.finalize()));
        self.coins.retain(|held| !coins.contains(held));
        Ok(WithdrawalReceipt {
            digest,
            coins_moved: coins.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coins() -> Vec<CoinRef> {
        vec![
            CoinRef {
                object_id: "0xc01".into(),
                balance_mist: 1_000_000,
            },
            CoinRef {
                object_id: "0xc02".into(),
                balance_mist: 2_500_000,
            },
        ]
    }

    #[test]
    fn withdraw_drains_the_wallet_and_yields_a_digest() {
        let mut wallet = SimulatedWallet::with_coins(coins());
        let held = wallet.list_coins("0xwallet").unwrap();
        let receipt = wallet
            .emergency_withdraw("0xwallet", &held, "0xsafe")
            .unwrap();
        assert_eq!(receipt.coins_moved, 2);
        assert!(receipt.digest.starts_with("0x"));
        assert_eq!(receipt.digest.len(), 66);
        assert_eq!(wallet.coin_count(), 0);
    }

    #[test]
    fn digest_is_deterministic_for_the_same_call() {
        let mut a = SimulatedWallet::with_coins(coins());
        let mut b = SimulatedWallet::with_coins(coins());
        let held = coins();
        let ra = a.emergency_withdraw("0xw", &held, "0xs").unwrap();
        let rb = b.emergency_withdraw("0xw", &held, "0xs").unwrap();
        assert_eq!(ra, rb);
    }

    #[test]
    fn withdrawing_nothing_is_a_wallet_error() {
        let mut wallet = SimulatedWallet::empty();
        assert!(matches!(
            wallet.emergency_withdraw("0xw", &[], "0xs"),
            Err(OracleError::ExternalService { service: "wallet", .. })
        ));
    }
}
