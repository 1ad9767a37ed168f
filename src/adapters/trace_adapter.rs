//! Trace sinks: discard, stderr, or in-memory capture.

use std::sync::Mutex;

use crate::ports::trace_port::{TraceEvent, TracePort};

/// Discards every event. The default sink for library use and tests.
pub struct NullTraceAdapter;

impl TracePort for NullTraceAdapter {
    fn record(&self, _event: TraceEvent) {}
}

/// Writes one line per event to stderr, keeping stdout clean for data.
pub struct StderrTraceAdapter;

impl TracePort for StderrTraceAdapter {
    fn record(&self, event: TraceEvent) {
        match event {
            TraceEvent::CandidateRegistered {
                index,
                lower,
                upper,
                trigger,
            } => eprintln!(
                "bar {}: registered candidate zone [{}, {}], trigger {}",
                index, lower, upper, trigger
            ),
            TraceEvent::CandidateRejected { index, reason } => {
                eprintln!("bar {}: rejected candidate ({})", index, reason)
            }
            TraceEvent::CandidateExpired { origin, index } => {
                eprintln!("bar {}: candidate from bar {} expired", index, origin)
            }
            TraceEvent::PositionOpened {
                index,
                stop_loss,
                take_profit,
            } => eprintln!(
                "bar {}: opened position, stop {} target {}",
                index, stop_loss, take_profit
            ),
            TraceEvent::PositionClosed { index, cause } => {
                eprintln!("bar {}: closed position ({})", index, cause)
            }
            TraceEvent::EntryFilled { index, price, size } => {
                eprintln!("bar {}: entry filled at {} for size {}", index, price, size)
            }
            TraceEvent::ExitFilled {
                index,
                price,
                proceeds,
            } => eprintln!(
                "bar {}: exit filled at {} returning {}",
                index, price, proceeds
            ),
            TraceEvent::EvaluationFailed { parameters, reason } => {
                eprintln!("evaluation failed for {}: {}", parameters, reason)
            }
        }
    }
}

/// Captures events for inspection. Safe to share across the grid
/// search's worker threads.
#[derive(Default)]
pub struct MemoryTraceAdapter {
    events: Mutex<Vec<TraceEvent>>,
}

impl MemoryTraceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

impl TracePort for MemoryTraceAdapter {
    fn record(&self, event: TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
