//! Parameter search: scores every grid combination against one series.

pub mod grid;
pub mod top_n;

use rayon::prelude::*;

use crate::domain::backtest::Performance;
use crate::domain::error::GaptraderError;
use crate::domain::evaluator::top_n::TopN;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;
use crate::ports::trace_port::{TraceEvent, TracePort};

/// One surviving grid-search result, ready for reporting.
#[derive(Debug, Clone)]
pub struct EvaluationRecord {
    pub strategy: String,
    pub broker: String,
    pub symbol: String,
    pub period: String,
    pub profit: f64,
    pub performance: Performance,
    pub parameters: String,
}

/// Tally of one grid search.
#[derive(Debug)]
pub struct GridOutcome {
    /// Best surviving records, highest profit first.
    pub top: Vec<EvaluationRecord>,
    pub evaluated: usize,
    pub failed: usize,
}

/// Runs strategies over one fixed series identified by broker, symbol
/// and period. The series is loaded once and shared by every run.
pub struct Evaluator {
    broker: String,
    symbol: String,
    period: String,
    bars: Vec<OhlcvBar>,
}

impl Evaluator {
    pub fn new(
        data: &dyn DataPort,
        broker: &str,
        symbol: &str,
        period: &str,
    ) -> Result<Evaluator, GaptraderError> {
        let bars = data.fetch_series(broker, symbol, period)?;
        if bars.is_empty() {
            return Err(GaptraderError::NoData {
                broker: broker.to_string(),
                symbol: symbol.to_string(),
                period: period.to_string(),
            });
        }
        Ok(Evaluator::from_series(broker, symbol, period, bars))
    }

    pub fn from_series(
        broker: &str,
        symbol: &str,
        period: &str,
        bars: Vec<OhlcvBar>,
    ) -> Evaluator {
        Evaluator {
            broker: broker.to_string(),
            symbol: symbol.to_string(),
            period: period.to_string(),
            bars,
        }
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    /// Scores every combination in parallel and keeps the `top_n` most
    /// profitable. A combination that fails to build or simulate is
    /// counted and traced, never fatal; a non-finite profit counts as a
    /// failure too so it cannot outrank real results.
    pub fn grid_search<P>(
        &self,
        combos: &[P],
        build: &(dyn Fn(&P) -> Result<Box<dyn Strategy>, GaptraderError> + Sync),
        top_n: usize,
        trace: &dyn TracePort,
    ) -> GridOutcome
    where
        P: std::fmt::Display + Sync,
    {
        let outcomes: Vec<Result<(&'static str, Performance), GaptraderError>> = combos
            .par_iter()
            .map(|params| {
                let strategy = build(params)?;
                let performance = strategy.run_backtest(&self.bars, trace)?;
                Ok((strategy.name(), performance))
            })
            .collect();

        let mut top = TopN::new(top_n);
        let mut failed = 0;
        for (params, outcome) in combos.iter().zip(outcomes) {
            match outcome {
                Ok((name, performance)) if performance.total_profit.is_finite() => {
                    let profit = performance.total_profit;
                    top.insert(
                        profit,
                        EvaluationRecord {
                            strategy: name.to_string(),
                            broker: self.broker.clone(),
                            symbol: self.symbol.clone(),
                            period: self.period.clone(),
                            profit,
                            performance,
                            parameters: params.to_string(),
                        },
                    );
                }
                Ok(_) => {
                    failed += 1;
                    trace.record(TraceEvent::EvaluationFailed {
                        parameters: params.to_string(),
                        reason: "non-finite profit".to_string(),
                    });
                }
                Err(err) => {
                    failed += 1;
                    trace.record(TraceEvent::EvaluationFailed {
                        parameters: params.to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        GridOutcome {
            top: top.into_items(),
            evaluated: combos.len(),
            failed,
        }
    }
}
