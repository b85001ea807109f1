//! Shared fixture for integration tests

#![allow(dead_code)]

use lottery_engine::{
    Address, Collaborators, InMemoryBank, Lottery, LotteryConfig, ManualClock, MockVrfCoordinator,
    Wei,
};
use std::sync::Arc;

pub const START_TIME: u64 = 1_700_000_000;

/// Generous LINK balance for the test subscription
pub const SUBSCRIPTION_FUNDING: Wei = 10_000_000_000_000_000_000;

pub struct TestLottery {
    pub lottery: Lottery,
    pub coordinator: Arc<MockVrfCoordinator>,
    pub bank: Arc<InMemoryBank>,
    pub clock: Arc<ManualClock>,
    pub config: LotteryConfig,
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_lottery(entrance_fee: Wei, interval_secs: u64) -> TestLottery {
    init_tracing();

    let coordinator = Arc::new(MockVrfCoordinator::default());
    let subscription_id = coordinator.create_subscription();
    coordinator
        .fund_subscription(subscription_id, SUBSCRIPTION_FUNDING)
        .expect("Failed to fund subscription");

    let bank = Arc::new(InMemoryBank::new());
    let clock = Arc::new(ManualClock::new(START_TIME));

    let mut config = LotteryConfig::with_fee_and_interval(entrance_fee, interval_secs);
    config.randomness.subscription_id = subscription_id;

    let lottery = Lottery::new(
        &config,
        Collaborators {
            oracle: coordinator.clone(),
            funds: bank.clone(),
            clock: clock.clone(),
        },
    )
    .expect("Failed to create lottery");

    TestLottery {
        lottery,
        coordinator,
        bank,
        clock,
        config,
    }
}

/// Player addresses 1..=n, stable across runs
pub fn players(n: u8) -> Vec<Address> {
    (1..=n).map(Address::repeat_byte).collect()
}
