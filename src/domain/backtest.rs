//! Trade simulation engines.
//!
//! Both engines walk the signal table in order against the price series and
//! fill every entry and exit at the *next* bar's open, modeling one-bar
//! execution latency. A fill request past the series end is an error, never
//! a silent fill. A position still open when the table ends has its reserved
//! size returned to capital unrealized.

use crate::domain::error::GaptraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::{SignalAction, SignalRow};
use crate::ports::trace_port::{TraceEvent, TracePort};

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of current capital reserved per trade.
    pub trade_percentage: f64,
    /// Flat per-unit price deduction applied at exit.
    pub fee: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 1_000.0,
            trade_percentage: 0.02,
            fee: 0.0,
        }
    }
}

/// Aggregate result of one simulation run.
///
/// The signal counts cover the whole table, not just executed trades, and
/// `total_trades` equals the table length; that is the reporting contract
/// downstream consumers rely on.
#[derive(Debug, Clone)]
pub struct Performance {
    pub total_trades: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub hold_signals: usize,
    pub final_value: f64,
    pub total_profit: f64,
}

impl std::fmt::Display for Performance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total_trades={} buy_signals={} sell_signals={} hold_signals={} final_value={} total_profit={}",
            self.total_trades,
            self.buy_signals,
            self.sell_signals,
            self.hold_signals,
            self.final_value,
            self.total_profit,
        )
    }
}

pub trait Backtest: Send + Sync {
    fn run(
        &self,
        signals: &[SignalRow],
        bars: &[OhlcvBar],
        trace: &dyn TracePort,
    ) -> Result<Performance, GaptraderError>;
}

/// Which simulation engine a config selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Long,
    LongShort,
}

impl EngineKind {
    pub fn from_name(name: &str) -> Option<EngineKind> {
        match name {
            "long" => Some(EngineKind::Long),
            "long-short" => Some(EngineKind::LongShort),
            _ => None,
        }
    }

    pub fn build(self, config: BacktestConfig) -> Box<dyn Backtest> {
        match self {
            EngineKind::Long => Box::new(LongBacktest::new(config)),
            EngineKind::LongShort => Box::new(LongShortBacktest::new(config)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenTrade {
    entry: f64,
    size: f64,
}

/// Long-only engine: Buy opens, Sell closes, everything else is ignored.
#[derive(Debug, Clone, Default)]
pub struct LongBacktest {
    pub config: BacktestConfig,
}

impl LongBacktest {
    pub fn new(config: BacktestConfig) -> Self {
        LongBacktest { config }
    }
}

impl Backtest for LongBacktest {
    fn run(
        &self,
        signals: &[SignalRow],
        bars: &[OhlcvBar],
        trace: &dyn TracePort,
    ) -> Result<Performance, GaptraderError> {
        let mut capital = self.config.initial_capital;
        let mut position: Option<OpenTrade> = None;

        for (i, row) in signals.iter().enumerate() {
            match (row.action, position) {
                (SignalAction::Buy, None) => {
                    let size = capital * self.config.trade_percentage;
                    let entry = next_open(bars, i)?;
                    capital -= size;
                    trace.record(TraceEvent::EntryFilled {
                        index: i + 1,
                        price: entry,
                        size,
                    });
                    position = Some(OpenTrade { entry, size });
                }
                (SignalAction::Sell, Some(trade)) => {
                    let exit = next_open(bars, i)?;
                    let proceeds = trade.size * (exit - self.config.fee) / trade.entry;
                    capital += proceeds;
                    trace.record(TraceEvent::ExitFilled {
                        index: i + 1,
                        price: exit,
                        proceeds,
                    });
                    position = None;
                }
                _ => {}
            }
        }

        if let Some(trade) = position {
            capital += trade.size;
        }

        Ok(summarize(signals, self.config.initial_capital, capital))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TradeDirection {
    Long,
    Short,
}

/// Engine trading both sides: while flat a Buy opens a long and a Sell opens
/// a short; the opposite action closes the open trade. Long round trips
/// account exactly like [`LongBacktest`].
#[derive(Debug, Clone, Default)]
pub struct LongShortBacktest {
    pub config: BacktestConfig,
}

impl LongShortBacktest {
    pub fn new(config: BacktestConfig) -> Self {
        LongShortBacktest { config }
    }
}

impl Backtest for LongShortBacktest {
    fn run(
        &self,
        signals: &[SignalRow],
        bars: &[OhlcvBar],
        trace: &dyn TracePort,
    ) -> Result<Performance, GaptraderError> {
        let mut capital = self.config.initial_capital;
        let mut position: Option<(TradeDirection, OpenTrade)> = None;

        for (i, row) in signals.iter().enumerate() {
            match (row.action, position) {
                (SignalAction::Buy, None) | (SignalAction::Sell, None) => {
                    let direction = match row.action {
                        SignalAction::Buy => TradeDirection::Long,
                        _ => TradeDirection::Short,
                    };
                    let size = capital * self.config.trade_percentage;
                    let entry = next_open(bars, i)?;
                    capital -= size;
                    trace.record(TraceEvent::EntryFilled {
                        index: i + 1,
                        price: entry,
                        size,
                    });
                    position = Some((direction, OpenTrade { entry, size }));
                }
                (SignalAction::Sell, Some((TradeDirection::Long, trade))) => {
                    let exit = next_open(bars, i)?;
                    let proceeds = trade.size * (exit - self.config.fee) / trade.entry;
                    capital += proceeds;
                    trace.record(TraceEvent::ExitFilled {
                        index: i + 1,
                        price: exit,
                        proceeds,
                    });
                    position = None;
                }
                (SignalAction::Buy, Some((TradeDirection::Short, trade))) => {
                    let exit = next_open(bars, i)?;
                    let proceeds =
                        trade.size * (2.0 * trade.entry - exit - self.config.fee) / trade.entry;
                    capital += proceeds;
                    trace.record(TraceEvent::ExitFilled {
                        index: i + 1,
                        price: exit,
                        proceeds,
                    });
                    position = None;
                }
                _ => {}
            }
        }

        if let Some((_, trade)) = position {
            capital += trade.size;
        }

        Ok(summarize(signals, self.config.initial_capital, capital))
    }
}

fn next_open(bars: &[OhlcvBar], index: usize) -> Result<f64, GaptraderError> {
    bars.get(index + 1)
        .map(|bar| bar.open)
        .ok_or(GaptraderError::FillOutOfRange {
            index,
            last: bars.len().saturating_sub(1),
        })
}

fn summarize(signals: &[SignalRow], initial_capital: f64, final_value: f64) -> Performance {
    let count = |action: SignalAction| signals.iter().filter(|r| r.action == action).count();
    Performance {
        total_trades: signals.len(),
        buy_signals: count(SignalAction::Buy),
        sell_signals: count(SignalAction::Sell),
        hold_signals: count(SignalAction::Hold),
        final_value,
        total_profit: final_value - initial_capital,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::trace_adapter::NullTraceAdapter;
    use chrono::{Days, NaiveDate};

    fn make_bar(day: u64, open: f64, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .checked_add_days(Days::new(day))
                .unwrap(),
            open,
            high: open.max(close) + 0.5,
            low: open.min(close) - 0.5,
            close,
            volume: 1_000,
        }
    }

    fn series(opens: &[f64]) -> Vec<OhlcvBar> {
        opens
            .iter()
            .enumerate()
            .map(|(i, &open)| make_bar(i as u64, open, open + 0.2))
            .collect()
    }

    fn rows_with(bars: &[OhlcvBar], actions: &[(usize, SignalAction)]) -> Vec<SignalRow> {
        let mut rows: Vec<SignalRow> = bars.iter().map(SignalRow::hold).collect();
        for &(i, action) in actions {
            rows[i].action = action;
        }
        rows
    }

    fn config() -> BacktestConfig {
        BacktestConfig {
            initial_capital: 1_000.0,
            trade_percentage: 0.02,
            fee: 0.0,
        }
    }

    #[test]
    fn all_hold_preserves_capital() {
        let bars = series(&[100.0, 101.0, 102.0, 103.0]);
        let rows = rows_with(&bars, &[]);
        let perf = LongBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();
        assert!((perf.final_value - 1_000.0).abs() < f64::EPSILON);
        assert!((perf.total_profit - 0.0).abs() < f64::EPSILON);
        assert_eq!(perf.buy_signals, 0);
        assert_eq!(perf.sell_signals, 0);
        assert_eq!(perf.hold_signals, 4);
        assert_eq!(perf.total_trades, 4);
    }

    #[test]
    fn long_round_trip_accounting() {
        let bars = series(&[100.0, 100.0, 100.0, 100.0, 110.0, 110.0]);
        let rows = rows_with(&bars, &[(1, SignalAction::Buy), (3, SignalAction::Sell)]);
        let perf = LongBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();

        // size = 20, entry = open[2] = 100, exit = open[4] = 110
        let expected = 1_000.0 - 20.0 + 20.0 * 110.0 / 100.0;
        assert!((perf.final_value - expected).abs() < 1e-9);
        assert!((perf.total_profit - 2.0).abs() < 1e-9);
        assert_eq!(perf.buy_signals, 1);
        assert_eq!(perf.sell_signals, 1);
        assert_eq!(perf.hold_signals, 4);
    }

    #[test]
    fn open_position_at_end_returns_reserved_size() {
        let bars = series(&[100.0, 100.0, 120.0, 130.0]);
        let rows = rows_with(&bars, &[(1, SignalAction::Buy)]);
        let perf = LongBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();
        assert!((perf.final_value - 1_000.0).abs() < f64::EPSILON);
        assert!((perf.total_profit - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn buy_on_last_bar_fails_loudly() {
        let bars = series(&[100.0, 100.0, 100.0]);
        let rows = rows_with(&bars, &[(2, SignalAction::Buy)]);
        let err = LongBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap_err();
        assert!(matches!(
            err,
            GaptraderError::FillOutOfRange { index: 2, last: 2 }
        ));
    }

    #[test]
    fn long_engine_ignores_sell_while_flat() {
        let bars = series(&[100.0, 100.0, 100.0, 100.0]);
        let rows = rows_with(&bars, &[(1, SignalAction::Sell)]);
        let perf = LongBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();
        assert!((perf.final_value - 1_000.0).abs() < f64::EPSILON);
        assert_eq!(perf.sell_signals, 1);
    }

    #[test]
    fn exit_fee_reduces_proceeds() {
        let bars = series(&[100.0, 100.0, 100.0, 100.0, 110.0, 110.0]);
        let rows = rows_with(&bars, &[(1, SignalAction::Buy), (3, SignalAction::Sell)]);
        let with_fee = BacktestConfig {
            fee: 1.0,
            ..config()
        };
        let perf = LongBacktest::new(with_fee)
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();
        // proceeds = 20 * (110 - 1) / 100
        let expected = 1_000.0 - 20.0 + 20.0 * 109.0 / 100.0;
        assert!((perf.final_value - expected).abs() < 1e-9);
    }

    #[test]
    fn long_short_long_cycle_matches_long_engine() {
        let bars = series(&[100.0, 100.0, 100.0, 100.0, 110.0, 110.0]);
        let rows = rows_with(&bars, &[(1, SignalAction::Buy), (3, SignalAction::Sell)]);
        let long = LongBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();
        let both = LongShortBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();
        assert!((long.final_value - both.final_value).abs() < f64::EPSILON);
    }

    #[test]
    fn short_round_trip_profits_when_price_falls() {
        let bars = series(&[100.0, 100.0, 100.0, 100.0, 90.0, 90.0]);
        let rows = rows_with(&bars, &[(1, SignalAction::Sell), (3, SignalAction::Buy)]);
        let perf = LongShortBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();
        // size = 20, entry = 100, exit = 90: proceeds = 20 * (200 - 90) / 100
        let expected = 1_000.0 - 20.0 + 20.0 * 110.0 / 100.0;
        assert!((perf.final_value - expected).abs() < 1e-9);
        assert!((perf.total_profit - 2.0).abs() < 1e-9);
    }

    #[test]
    fn short_round_trip_loses_when_price_rises() {
        let bars = series(&[100.0, 100.0, 100.0, 100.0, 110.0, 110.0]);
        let rows = rows_with(&bars, &[(1, SignalAction::Sell), (3, SignalAction::Buy)]);
        let perf = LongShortBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();
        let expected = 1_000.0 - 20.0 + 20.0 * 90.0 / 100.0;
        assert!((perf.final_value - expected).abs() < 1e-9);
        assert!((perf.total_profit + 2.0).abs() < 1e-9);
    }

    #[test]
    fn counts_cover_full_table() {
        let bars = series(&[100.0; 8]);
        let rows = rows_with(
            &bars,
            &[
                (1, SignalAction::Buy),
                (3, SignalAction::Sell),
                (5, SignalAction::Buy),
            ],
        );
        let perf = LongBacktest::new(config())
            .run(&rows, &bars, &NullTraceAdapter)
            .unwrap();
        assert_eq!(perf.total_trades, 8);
        assert_eq!(perf.buy_signals, 2);
        assert_eq!(perf.sell_signals, 1);
        assert_eq!(perf.hold_signals, 5);
    }
}
