use std::env;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use log::info;

use stepsign::oracle::{
    CoinRef, MonitorConfig, MonitorOutcome, PriceMonitor, SimulatedDeepBook, SimulatedWallet,
};

fn demo_wallet() -> SimulatedWallet {
    SimulatedWallet::with_coins(vec![
        CoinRef {
            object_id: "0xa1c3".into(),
            balance_mist: 1_000_000_000,
        },
        CoinRef {
            object_id: "0xb2d4".into(),
            balance_mist: 250_000_000,
        },
        CoinRef {
            object_id: "0xc3e5".into(),
            balance_mist: 42_000_000,
        },
    ])
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <SHARED_WALLET_ID> <SAFE_ADDRESS>", args[0]);
        eprintln!("Watches the SUI/USDC price and moves the shared wallet's coins to the safe address when the threshold is breached.");
        process::exit(2);
    }
    let shared_wallet_id = &args[1];
    let safe_address = &args[2];

    let feed_seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let feed = SimulatedDeepBook::new(feed_seed);
    let mut monitor = PriceMonitor::new(feed, demo_wallet(), MonitorConfig::default());

    let outcome = monitor
        .run(shared_wallet_id, safe_address)
        .context("price monitor stopped")?;
    match outcome {
        MonitorOutcome::Withdrawn(receipt) => {
            info!(
                "emergency withdrawal confirmed ({} coins moved)",
                receipt.coins_moved
            );
            info!(
                "explore the transaction: https://suiscan.xyz/testnet/tx/{}",
                receipt.digest
            );
        }
        MonitorOutcome::NothingToWithdraw => {
            info!("shared wallet already empty; demo over");
        }
        MonitorOutcome::PollBudgetExhausted => {
            info!("poll budget exhausted without a threshold breach");
        }
    }
    Ok(())
}
