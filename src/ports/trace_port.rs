//! Observability port trait.
//!
//! Components never log globally; they emit structured events into a sink
//! injected per run. The `Send + Sync` bound lets one sink serve the grid
//! search's parallel evaluations.

use crate::domain::signal::SignalCause;

#[derive(Debug, Clone)]
pub enum TraceEvent {
    CandidateRegistered {
        index: usize,
        lower: f64,
        upper: f64,
        trigger: f64,
    },
    CandidateRejected {
        index: usize,
        reason: &'static str,
    },
    CandidateExpired {
        origin: usize,
        index: usize,
    },
    PositionOpened {
        index: usize,
        stop_loss: f64,
        take_profit: f64,
    },
    PositionClosed {
        index: usize,
        cause: SignalCause,
    },
    EntryFilled {
        index: usize,
        price: f64,
        size: f64,
    },
    ExitFilled {
        index: usize,
        price: f64,
        proceeds: f64,
    },
    EvaluationFailed {
        parameters: String,
        reason: String,
    },
}

pub trait TracePort: Send + Sync {
    fn record(&self, event: TraceEvent);
}
