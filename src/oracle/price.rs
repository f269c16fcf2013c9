use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::oracle::OracleError;

/// Source of the SUI/USDC mid price.
pub trait PriceFeed {
    fn current_price(&mut self) -> Result<f64, OracleError>;
}

/// Stand-in for the DeepBook order-book query: a seeded uniform walk inside
/// the demo band, which dips below the default threshold often enough to
/// exercise the withdrawal path.
pub struct SimulatedDeepBook {
    rng: StdRng,
}

impl SimulatedDeepBook {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PriceFeed for SimulatedDeepBook {
    fn current_price(&mut self) -> Result<f64, OracleError> {
        Ok(1.78 + self.rng.gen::<f64>() * 0.04)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_prices_stay_in_the_demo_band() {
        let mut feed = SimulatedDeepBook::new(1);
        for _ in 0..100 {
            let price = feed.current_price().unwrap();
            assert!((1.78..1.82).contains(&price));
        }
    }

    #[test]
    fn same_seed_walks_the_same_path() {
        let mut a = SimulatedDeepBook::new(9);
        let mut b = SimulatedDeepBook::new(9);
        for _ in 0..10 {
            assert_eq!(a.current_price().unwrap(), b.current_price().unwrap());
        }
    }
}
