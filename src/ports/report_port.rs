//! Report persistence port trait.

use crate::domain::error::GaptraderError;
use crate::domain::evaluator::EvaluationRecord;
use crate::domain::signal::SignalRow;

/// Port for persisting run output.
pub trait ReportPort {
    /// Write the per-bar signal table of one run.
    fn write_signals(&self, rows: &[SignalRow], output_path: &str) -> Result<(), GaptraderError>;

    /// Append ranked grid-search results, one row per evaluated combination.
    fn write_evaluations(
        &self,
        records: &[EvaluationRecord],
        output_path: &str,
    ) -> Result<(), GaptraderError>;
}
