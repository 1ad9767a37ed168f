//! Momentum strategy trading RSI threshold crossings.

use crate::domain::backtest::Backtest;
use crate::domain::error::GaptraderError;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::{SignalAction, SignalCause, SignalRow};
use crate::domain::strategy::{PositionState, Strategy};
use crate::ports::trace_port::{TraceEvent, TracePort};

/// Tuning knobs for [`RsiStrategy`].
#[derive(Debug, Clone)]
pub struct RsiParams {
    /// Averaging window for the RSI, in bars.
    pub window: usize,
    /// RSI level above which an open position is closed.
    pub overbought: f64,
    /// RSI level below which a position is opened.
    pub oversold: f64,
    /// Stop-loss distance below the entry close, e.g. 0.05 for 5%.
    pub stop_loss_pct: f64,
    /// Take-profit distance above the entry close, e.g. 0.1 for 10%.
    pub take_profit_pct: f64,
}

impl Default for RsiParams {
    fn default() -> Self {
        RsiParams {
            window: 14,
            overbought: 70.0,
            oversold: 30.0,
            stop_loss_pct: 0.05,
            take_profit_pct: 0.1,
        }
    }
}

impl std::fmt::Display for RsiParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "stop_loss={} take_profit={} rsi_window={} rsi_overbought={} rsi_oversold={}",
            self.stop_loss_pct,
            self.take_profit_pct,
            self.window,
            self.overbought,
            self.oversold,
        )
    }
}

impl RsiParams {
    fn validate(&self) -> Result<(), GaptraderError> {
        if self.window == 0 {
            return Err(GaptraderError::Params {
                reason: "window must be at least 1 bar".to_string(),
            });
        }
        if self.oversold < 0.0 || self.overbought > 100.0 || self.oversold >= self.overbought {
            return Err(GaptraderError::Params {
                reason: format!(
                    "thresholds must satisfy 0 <= oversold < overbought <= 100, got {} and {}",
                    self.oversold, self.overbought
                ),
            });
        }
        if self.stop_loss_pct <= 0.0 || self.stop_loss_pct >= 1.0 {
            return Err(GaptraderError::Params {
                reason: format!(
                    "stop_loss_pct must be between 0 and 1, got {}",
                    self.stop_loss_pct
                ),
            });
        }
        if self.take_profit_pct <= 0.0 {
            return Err(GaptraderError::Params {
                reason: format!("take_profit_pct must be positive, got {}", self.take_profit_pct),
            });
        }
        Ok(())
    }
}

/// Long-only strategy buying oversold bars and selling overbought ones.
pub struct RsiStrategy {
    params: RsiParams,
    backtest: Box<dyn Backtest>,
}

impl RsiStrategy {
    pub fn new(params: RsiParams, backtest: Box<dyn Backtest>) -> Result<Self, GaptraderError> {
        params.validate()?;
        Ok(RsiStrategy { params, backtest })
    }

    pub fn params(&self) -> &RsiParams {
        &self.params
    }
}

impl Strategy for RsiStrategy {
    fn name(&self) -> &'static str {
        "rsi"
    }

    fn generate_signals(
        &self,
        bars: &[OhlcvBar],
        trace: &dyn TracePort,
    ) -> Result<Vec<SignalRow>, GaptraderError> {
        let rsi = calculate_rsi(bars, self.params.window);
        let mut rows: Vec<SignalRow> = bars.iter().map(SignalRow::hold).collect();

        let mut position = PositionState::Out;
        let mut stop_loss = 0.0;
        let mut take_profit = 0.0;

        for i in 0..bars.len() {
            let close = bars[i].close;
            match position {
                // Warmup bars carry no RSI and cannot open a position.
                PositionState::Out => {
                    if rsi[i].is_some_and(|value| value < self.params.oversold) {
                        stop_loss = close * (1.0 - self.params.stop_loss_pct);
                        take_profit = close * (1.0 + self.params.take_profit_pct);
                        rows[i].action = SignalAction::Buy;
                        rows[i].cause = SignalCause::Threshold;
                        rows[i].stop_loss = Some(stop_loss);
                        rows[i].take_profit = Some(take_profit);
                        position = PositionState::In;
                        trace.record(TraceEvent::PositionOpened {
                            index: i,
                            stop_loss,
                            take_profit,
                        });
                    }
                }
                PositionState::In => {
                    let cause = if close <= stop_loss {
                        Some(SignalCause::StopLoss)
                    } else if close >= take_profit {
                        Some(SignalCause::TakeProfit)
                    } else if rsi[i].is_some_and(|value| value > self.params.overbought) {
                        Some(SignalCause::Threshold)
                    } else {
                        None
                    };
                    if let Some(cause) = cause {
                        rows[i].action = SignalAction::Sell;
                        rows[i].cause = cause;
                        position = PositionState::Out;
                        trace.record(TraceEvent::PositionClosed { index: i, cause });
                    }
                }
            }
        }

        Ok(rows)
    }

    fn backtest(&self) -> &dyn Backtest {
        self.backtest.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::trace_adapter::NullTraceAdapter;
    use crate::domain::backtest::{BacktestConfig, LongBacktest};
    use chrono::NaiveDate;

    fn make_bar(day: u32, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    fn make_series(closes: &[f64]) -> Vec<OhlcvBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| make_bar(i as u32 + 1, c))
            .collect()
    }

    fn strategy(params: RsiParams) -> RsiStrategy {
        RsiStrategy::new(params, Box::new(LongBacktest::new(BacktestConfig::default()))).unwrap()
    }

    #[test]
    fn constant_series_buys_once_the_window_fills() {
        // A flat series has zero gains and losses, which scores 0, deep
        // in oversold territory from the first computed bar onward.
        let bars = make_series(&[100.0; 20]);
        let rows = strategy(RsiParams::default())
            .generate_signals(&bars, &NullTraceAdapter)
            .unwrap();

        for i in 0..14 {
            assert_eq!(rows[i].action, SignalAction::Hold, "warmup bar {i}");
        }
        assert_eq!(rows[14].action, SignalAction::Buy);
        assert_eq!(rows[14].cause, SignalCause::Threshold);
        assert!((rows[14].stop_loss.unwrap() - 95.0).abs() < 1e-9);
        assert!((rows[14].take_profit.unwrap() - 110.0).abs() < 1e-9);
        for i in 15..20 {
            assert_eq!(rows[i].action, SignalAction::Hold, "bar {i}");
        }
    }

    #[test]
    fn balanced_series_never_trades() {
        // Alternating equal gains and losses keep the RSI near 50,
        // inside both thresholds.
        let closes: Vec<f64> = (0..20)
            .map(|i| if i % 2 == 0 { 100.0 } else { 102.0 })
            .collect();
        let rows = strategy(RsiParams::default())
            .generate_signals(&make_series(&closes), &NullTraceAdapter)
            .unwrap();

        assert!(rows.iter().all(|row| row.action == SignalAction::Hold));
    }

    #[test]
    fn overbought_crossing_closes_the_position() {
        let bars = make_series(&[100.0, 90.0, 80.0, 90.0, 100.0]);
        let params = RsiParams {
            window: 2,
            stop_loss_pct: 0.5,
            take_profit_pct: 10.0,
            ..RsiParams::default()
        };
        let rows = strategy(params).generate_signals(&bars, &NullTraceAdapter).unwrap();

        // Two straight losses score 0 at bar 2; the rebound lifts the
        // score to 50 at bar 3 and 75 at bar 4.
        assert_eq!(rows[2].action, SignalAction::Buy);
        assert_eq!(rows[3].action, SignalAction::Hold);
        assert_eq!(rows[4].action, SignalAction::Sell);
        assert_eq!(rows[4].cause, SignalCause::Threshold);
    }

    #[test]
    fn stop_loss_takes_priority_over_score_exits() {
        let bars = make_series(&[100.0, 90.0, 80.0, 70.0]);
        let params = RsiParams {
            window: 2,
            stop_loss_pct: 0.1,
            take_profit_pct: 10.0,
            ..RsiParams::default()
        };
        let rows = strategy(params).generate_signals(&bars, &NullTraceAdapter).unwrap();

        assert_eq!(rows[2].action, SignalAction::Buy);
        assert_eq!(rows[3].action, SignalAction::Sell);
        assert_eq!(rows[3].cause, SignalCause::StopLoss);
    }

    #[test]
    fn take_profit_fires_before_the_score_is_checked() {
        let bars = make_series(&[100.0, 90.0, 80.0, 95.0]);
        let params = RsiParams {
            window: 2,
            stop_loss_pct: 0.5,
            take_profit_pct: 0.1,
            ..RsiParams::default()
        };
        let rows = strategy(params).generate_signals(&bars, &NullTraceAdapter).unwrap();

        assert_eq!(rows[2].action, SignalAction::Buy);
        assert_eq!(rows[3].action, SignalAction::Sell);
        assert_eq!(rows[3].cause, SignalCause::TakeProfit);
    }

    #[test]
    fn reenters_after_a_stop_loss_exit() {
        let bars = make_series(&[100.0, 90.0, 80.0, 70.0, 60.0]);
        let params = RsiParams {
            window: 2,
            stop_loss_pct: 0.1,
            take_profit_pct: 10.0,
            ..RsiParams::default()
        };
        let rows = strategy(params).generate_signals(&bars, &NullTraceAdapter).unwrap();

        assert_eq!(rows[2].action, SignalAction::Buy);
        assert_eq!(rows[3].action, SignalAction::Sell);
        assert_eq!(rows[4].action, SignalAction::Buy);
    }

    #[test]
    fn rejects_inverted_thresholds() {
        let params = RsiParams {
            oversold: 70.0,
            overbought: 30.0,
            ..RsiParams::default()
        };
        let result = RsiStrategy::new(params, Box::new(LongBacktest::new(BacktestConfig::default())));
        assert!(matches!(result, Err(GaptraderError::Params { .. })));
    }

    #[test]
    fn rejects_zero_window() {
        let params = RsiParams {
            window: 0,
            ..RsiParams::default()
        };
        let result = RsiStrategy::new(params, Box::new(LongBacktest::new(BacktestConfig::default())));
        assert!(matches!(result, Err(GaptraderError::Params { .. })));
    }

    #[test]
    fn rejects_thresholds_outside_the_scale() {
        for (oversold, overbought) in [(-5.0, 70.0), (30.0, 101.0)] {
            let params = RsiParams {
                oversold,
                overbought,
                ..RsiParams::default()
            };
            let result =
                RsiStrategy::new(params, Box::new(LongBacktest::new(BacktestConfig::default())));
            assert!(
                matches!(result, Err(GaptraderError::Params { .. })),
                "oversold {oversold} overbought {overbought}"
            );
        }
    }
}
