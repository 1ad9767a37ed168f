//! Coin-flip baseline: a uniformly random action on every bar.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::backtest::Backtest;
use crate::domain::error::GaptraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::{SignalAction, SignalRow};
use crate::domain::strategy::Strategy;
use crate::ports::trace_port::TracePort;

pub const DEFAULT_SEED: u64 = 123;

/// Baseline strategy for sanity-checking an engine: every bar draws
/// Buy, Sell or Hold with equal probability, ignoring position state.
pub struct RandomStrategy {
    seed: u64,
    backtest: Box<dyn Backtest>,
}

impl RandomStrategy {
    pub fn new(seed: u64, backtest: Box<dyn Backtest>) -> Self {
        RandomStrategy { seed, backtest }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &'static str {
        "random"
    }

    fn generate_signals(
        &self,
        bars: &[OhlcvBar],
        _trace: &dyn TracePort,
    ) -> Result<Vec<SignalRow>, GaptraderError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let rows = bars
            .iter()
            .map(|bar| {
                let mut row = SignalRow::hold(bar);
                row.action = match rng.gen_range(0..3) {
                    0 => SignalAction::Buy,
                    1 => SignalAction::Sell,
                    _ => SignalAction::Hold,
                };
                row
            })
            .collect();
        Ok(rows)
    }

    fn backtest(&self) -> &dyn Backtest {
        self.backtest.as_ref()
    }
}
