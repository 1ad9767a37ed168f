//! Per-bar trading signals.

use crate::domain::indicator::GapLabel;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

/// Why a signal fired. Rendered as a kebab-case tag in persisted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalCause {
    /// Entry confirmed by a gap-pattern breakout.
    Pattern,
    /// Entry or exit driven by an indicator threshold cross.
    Threshold,
    StopLoss,
    TakeProfit,
    None,
}

/// One output row per input bar, aligned 1:1 with the price series and
/// immutable once the generating scan completes.
#[derive(Debug, Clone)]
pub struct SignalRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub label: Option<GapLabel>,
    pub action: SignalAction,
    pub cause: SignalCause,
    /// Set on the entry row only.
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl SignalRow {
    /// Default row for a bar: Hold with no cause and no position levels.
    pub fn hold(bar: &OhlcvBar) -> Self {
        SignalRow {
            date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            label: None,
            action: SignalAction::Hold,
            cause: SignalCause::None,
            stop_loss: None,
            take_profit: None,
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalAction::Buy => write!(f, "Buy"),
            SignalAction::Sell => write!(f, "Sell"),
            SignalAction::Hold => write!(f, "Hold"),
        }
    }
}

impl fmt::Display for SignalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalCause::Pattern => write!(f, "pattern-algorithm"),
            SignalCause::Threshold => write!(f, "threshold-algorithm"),
            SignalCause::StopLoss => write!(f, "stop-loss"),
            SignalCause::TakeProfit => write!(f, "take-profit"),
            SignalCause::None => write!(f, "none"),
        }
    }
}
