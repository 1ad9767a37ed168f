//! Gap-pattern strategy: registers unfilled gaps as trade candidates and
//! buys when price retraces into one.

use crate::domain::backtest::Backtest;
use crate::domain::error::GaptraderError;
use crate::domain::indicator::gap::calculate_gaps;
use crate::domain::indicator::{GapDirection, GapLabel, MergeMode};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::{SignalAction, SignalCause, SignalRow};
use crate::domain::strategy::{PositionState, Strategy};
use crate::ports::trace_port::{TraceEvent, TracePort};

/// Which bound of a registered gap acts as the entry trigger price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakoutTrigger {
    #[default]
    UpperBound,
    LowerBound,
}

impl std::fmt::Display for BreakoutTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakoutTrigger::UpperBound => write!(f, "upper-bound"),
            BreakoutTrigger::LowerBound => write!(f, "lower-bound"),
        }
    }
}

impl BreakoutTrigger {
    /// Inverse of [`std::fmt::Display`], for config values.
    pub fn from_name(name: &str) -> Option<BreakoutTrigger> {
        match name {
            "upper-bound" => Some(BreakoutTrigger::UpperBound),
            "lower-bound" => Some(BreakoutTrigger::LowerBound),
            _ => None,
        }
    }
}

/// Tuning knobs for [`GapStrategy`].
#[derive(Debug, Clone)]
pub struct GapParams {
    /// How consecutive same-direction gaps are folded before scanning.
    pub merge: MergeMode,
    /// Bars a candidate stays tradeable after the bar that produced it.
    pub retention_period: usize,
    /// Minimum gap size as a percentage of the close, e.g. 0.1 for 0.1%.
    pub min_gap_pct: f64,
    /// Exact consecutive-run rank a gap must have to be registered.
    pub min_rank: u32,
    /// Which gap bound the entry trigger compares against.
    pub breakout_trigger: BreakoutTrigger,
    /// Stop-loss distance below the entry close, e.g. 0.05 for 5%.
    pub stop_loss_pct: f64,
    /// Take-profit distance above the entry close, e.g. 0.1 for 10%.
    pub take_profit_pct: f64,
}

impl Default for GapParams {
    fn default() -> Self {
        GapParams {
            merge: MergeMode::None,
            retention_period: 100,
            min_gap_pct: 0.1,
            min_rank: 1,
            breakout_trigger: BreakoutTrigger::UpperBound,
            stop_loss_pct: 0.05,
            take_profit_pct: 0.1,
        }
    }
}

impl std::fmt::Display for GapParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "stop_loss={} take_profit={} retention_period={} min_gap_pct={} merge={} min_rank={} trigger={}",
            self.stop_loss_pct,
            self.take_profit_pct,
            self.retention_period,
            self.min_gap_pct,
            self.merge,
            self.min_rank,
            self.breakout_trigger,
        )
    }
}

impl GapParams {
    fn validate(&self) -> Result<(), GaptraderError> {
        if self.retention_period == 0 {
            return Err(GaptraderError::Params {
                reason: "retention_period must be at least 1 bar".to_string(),
            });
        }
        if self.min_gap_pct < 0.0 {
            return Err(GaptraderError::Params {
                reason: "min_gap_pct cannot be negative".to_string(),
            });
        }
        if self.min_rank == 0 {
            return Err(GaptraderError::Params {
                reason: "min_rank must be at least 1".to_string(),
            });
        }
        if self.min_rank > 1 && self.merge != MergeMode::None {
            return Err(GaptraderError::Params {
                reason: "min_rank above 1 requires merging disabled; merged runs always rank 1"
                    .to_string(),
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

/// A registered gap waiting for price to retrace into it.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    origin: usize,
    lower: f64,
    upper: f64,
    trigger: f64,
}

/// Long-only strategy trading retracements into bullish gaps.
pub struct GapStrategy {
    params: GapParams,
    backtest: Box<dyn Backtest>,
}

impl GapStrategy {
    pub fn new(params: GapParams, backtest: Box<dyn Backtest>) -> Result<Self, GaptraderError> {
        params.validate()?;
        Ok(GapStrategy { params, backtest })
    }

    pub fn params(&self) -> &GapParams {
        &self.params
    }

    fn register_or_reject(
        &self,
        bars: &[OhlcvBar],
        index: usize,
        label: &GapLabel,
        candidates: &mut Vec<Candidate>,
        trace: &dyn TracePort,
    ) {
        if label.size_pct(bars[index].close) <= self.params.min_gap_pct {
            trace.record(TraceEvent::CandidateRejected {
                index,
                reason: "below-min-gap-size",
            });
            return;
        }
        if label.rank != self.params.min_rank {
            trace.record(TraceEvent::CandidateRejected {
                index,
                reason: "rank-mismatch",
            });
            return;
        }
        // A labeled bar always has a neighbor on both sides, so the raw
        // neighbor bounds are in range even when merging widened the label.
        let lower = bars[index - 1].high;
        let upper = bars[index + 1].low;
        let trigger = match self.params.breakout_trigger {
            BreakoutTrigger::UpperBound => upper,
            BreakoutTrigger::LowerBound => lower,
        };
        candidates.push(Candidate {
            origin: index,
            lower,
            upper,
            trigger,
        });
        trace.record(TraceEvent::CandidateRegistered {
            index,
            lower,
            upper,
            trigger,
        });
    }
}

impl Strategy for GapStrategy {
    fn name(&self) -> &'static str {
        "gap"
    }

    fn generate_signals(
        &self,
        bars: &[OhlcvBar],
        trace: &dyn TracePort,
    ) -> Result<Vec<SignalRow>, GaptraderError> {
        let labels = calculate_gaps(bars, self.params.merge);
        let mut rows: Vec<SignalRow> = bars
            .iter()
            .zip(&labels)
            .map(|(bar, label)| {
                let mut row = SignalRow::hold(bar);
                row.label = label.clone();
                row
            })
            .collect();

        let mut position = PositionState::Out;
        let mut candidates: Vec<Candidate> = Vec::new();
        let mut stop_loss = 0.0;
        let mut take_profit = 0.0;

        for i in 1..bars.len() {
            candidates.retain(|candidate| {
                let keep = candidate.origin + self.params.retention_period >= i;
                if !keep {
                    trace.record(TraceEvent::CandidateExpired {
                        origin: candidate.origin,
                        index: i,
                    });
                }
                keep
            });

            let bullish_label = labels[i]
                .as_ref()
                .filter(|label| label.direction == GapDirection::Bullish);

            match (position, bullish_label) {
                // A bar carrying a bullish gap only registers; the entry
                // check waits for a later bar.
                (PositionState::Out, Some(label)) => {
                    self.register_or_reject(bars, i, label, &mut candidates, trace);
                }
                (PositionState::Out, None) if !candidates.is_empty() => {
                    let close = bars[i].close;
                    let hit = candidates
                        .iter()
                        .position(|candidate| close < candidate.trigger);
                    if let Some(slot) = hit {
                        candidates.remove(slot);
                        stop_loss = close * (1.0 - self.params.stop_loss_pct);
                        take_profit = close * (1.0 + self.params.take_profit_pct);
                        rows[i].action = SignalAction::Buy;
                        rows[i].cause = SignalCause::Pattern;
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
                (PositionState::In, _) => {
                    let close = bars[i].close;
                    if close <= stop_loss {
                        rows[i].action = SignalAction::Sell;
                        rows[i].cause = SignalCause::StopLoss;
                        position = PositionState::Out;
                        trace.record(TraceEvent::PositionClosed {
                            index: i,
                            cause: SignalCause::StopLoss,
                        });
                    } else if close >= take_profit {
                        rows[i].action = SignalAction::Sell;
                        rows[i].cause = SignalCause::TakeProfit;
                        position = PositionState::Out;
                        trace.record(TraceEvent::PositionClosed {
                            index: i,
                            cause: SignalCause::TakeProfit,
                        });
                    }
                }
                _ => {}
            }
        }

        Ok(rows)
    }

    fn backtest(&self) -> &dyn Backtest {
        self.backtest.as_ref()
    }
}
