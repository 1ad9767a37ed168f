//! Signal-generating strategies and the trait they share.

pub mod gap;
pub mod random;
pub mod rsi;

use crate::domain::backtest::{Backtest, Performance};
use crate::domain::error::GaptraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::SignalRow;
use crate::ports::trace_port::TracePort;

/// Whether the strategy currently holds a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionState {
    Out,
    In,
}

/// Which strategy a config selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Gap,
    Rsi,
    Random,
}

impl StrategyKind {
    pub fn from_name(name: &str) -> Option<StrategyKind> {
        match name {
            "gap" => Some(StrategyKind::Gap),
            "rsi" => Some(StrategyKind::Rsi),
            "random" => Some(StrategyKind::Random),
            _ => None,
        }
    }
}

/// A trading strategy: turns a bar series into a signal table and can
/// hand the table to its simulation engine for scoring.
pub trait Strategy {
    /// Short name used in reports, e.g. "gap".
    fn name(&self) -> &'static str;

    /// Walk the series and produce one signal row per bar.
    fn generate_signals(
        &self,
        bars: &[OhlcvBar],
        trace: &dyn TracePort,
    ) -> Result<Vec<SignalRow>, GaptraderError>;

    /// The simulation engine this strategy was built with.
    fn backtest(&self) -> &dyn Backtest;

    /// Generate signals and score them in one step.
    fn run_backtest(
        &self,
        bars: &[OhlcvBar],
        trace: &dyn TracePort,
    ) -> Result<Performance, GaptraderError> {
        let signals = self.generate_signals(bars, trace)?;
        self.backtest().run(&signals, bars, trace)
    }
}
