//! CSV report adapter: signal tables and ranked evaluation results.

use std::fs;
use std::path::Path;

use crate::domain::error::GaptraderError;
use crate::domain::evaluator::EvaluationRecord;
use crate::domain::signal::SignalRow;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    fn writer(output_path: &str) -> Result<csv::Writer<fs::File>, GaptraderError> {
        if let Some(parent) = Path::new(output_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        csv::Writer::from_path(output_path).map_err(|e| GaptraderError::Report {
            reason: format!("cannot open {}: {}", output_path, e),
        })
    }

    fn finish(mut writer: csv::Writer<fs::File>, output_path: &str) -> Result<(), GaptraderError> {
        writer.flush().map_err(|e| GaptraderError::Report {
            reason: format!("cannot write {}: {}", output_path, e),
        })
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl ReportPort for CsvReportAdapter {
    fn write_signals(&self, rows: &[SignalRow], output_path: &str) -> Result<(), GaptraderError> {
        let mut writer = Self::writer(output_path)?;
        writer
            .write_record([
                "date",
                "open",
                "high",
                "low",
                "close",
                "direction",
                "gap_lower",
                "gap_upper",
                "rank",
                "mitigated_at",
                "action",
                "cause",
                "stop_loss",
                "take_profit",
            ])
            .map_err(|e| GaptraderError::Report {
                reason: format!("cannot write {}: {}", output_path, e),
            })?;

        for row in rows {
            let (direction, gap_lower, gap_upper, rank, mitigated_at) = match &row.label {
                Some(label) => (
                    label.direction.to_string(),
                    label.lower.to_string(),
                    label.upper.to_string(),
                    label.rank.to_string(),
                    label
                        .mitigated_at
                        .map(|i| i.to_string())
                        .unwrap_or_default(),
                ),
                None => Default::default(),
            };
            writer
                .write_record([
                    row.date.format("%Y-%m-%d").to_string(),
                    row.open.to_string(),
                    row.high.to_string(),
                    row.low.to_string(),
                    row.close.to_string(),
                    direction,
                    gap_lower,
                    gap_upper,
                    rank,
                    mitigated_at,
                    row.action.to_string(),
                    row.cause.to_string(),
                    optional(row.stop_loss),
                    optional(row.take_profit),
                ])
                .map_err(|e| GaptraderError::Report {
                    reason: format!("cannot write {}: {}", output_path, e),
                })?;
        }

        Self::finish(writer, output_path)
    }

    fn write_evaluations(
        &self,
        records: &[EvaluationRecord],
        output_path: &str,
    ) -> Result<(), GaptraderError> {
        if records.is_empty() {
            return Err(GaptraderError::Report {
                reason: "no evaluation results to save".to_string(),
            });
        }

        // One version stamp for the whole file, taken at save time.
        let version = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let mut writer = Self::writer(output_path)?;
        writer
            .write_record([
                "strategy",
                "broker",
                "symbol",
                "period",
                "profit",
                "performance",
                "parameters",
                "version",
            ])
            .map_err(|e| GaptraderError::Report {
                reason: format!("cannot write {}: {}", output_path, e),
            })?;

        for record in records {
            writer
                .write_record([
                    record.strategy.clone(),
                    record.broker.clone(),
                    record.symbol.clone(),
                    record.period.clone(),
                    record.profit.to_string(),
                    record.performance.to_string(),
                    record.parameters.clone(),
                    version.clone(),
                ])
                .map_err(|e| GaptraderError::Report {
                    reason: format!("cannot write {}: {}", output_path, e),
                })?;
        }

        Self::finish(writer, output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::Performance;
    use crate::domain::indicator::{GapDirection, GapLabel};
    use crate::domain::ohlcv::OhlcvBar;
    use crate::domain::signal::{SignalAction, SignalCause};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_rows() -> Vec<SignalRow> {
        let bar = OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000,
        };
        let mut labeled = SignalRow::hold(&bar);
        labeled.label = Some(GapLabel {
            direction: GapDirection::Bullish,
            lower: 95.0,
            upper: 99.0,
            rank: 1,
            mitigated_at: Some(7),
        });

        let next = OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 16).unwrap(),
            open: 105.0,
            high: 115.0,
            low: 100.0,
            close: 96.0,
            volume: 60_000,
        };
        let mut bought = SignalRow::hold(&next);
        bought.action = SignalAction::Buy;
        bought.cause = SignalCause::Pattern;
        bought.stop_loss = Some(94.0);
        bought.take_profit = Some(99.5);

        vec![labeled, bought]
    }

    #[test]
    fn signal_table_round_trips_through_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signals.csv");
        let adapter = CsvReportAdapter;

        adapter
            .write_signals(&sample_rows(), path.to_str().unwrap())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,open,high,low,close,direction,gap_lower,gap_upper,rank,mitigated_at,action,cause,stop_loss,take_profit"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2024-01-15,100,110,90,105,bullish,95,99,1,7,Hold,none,,"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2024-01-16,105,115,100,96,,,,,,Buy,pattern-algorithm,94,99.5"
        );
    }

    #[test]
    fn evaluations_carry_a_version_stamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        let adapter = CsvReportAdapter;

        let record = EvaluationRecord {
            strategy: "gap".to_string(),
            broker: "xtb".to_string(),
            symbol: "GOLD".to_string(),
            period: "1D".to_string(),
            profit: 0.37,
            performance: Performance {
                total_trades: 10,
                buy_signals: 1,
                sell_signals: 1,
                hold_signals: 8,
                final_value: 1000.37,
                total_profit: 0.37,
            },
            parameters: "stop_loss=0.01 take_profit=0.02".to_string(),
        };
        adapter
            .write_evaluations(&[record], path.to_str().unwrap())
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "strategy,broker,symbol,period,profit,performance,parameters,version"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("gap,xtb,GOLD,1D,0.37,"));
        assert!(row.contains("total_trades=10"));
        // The version column is a timestamp like 2024-01-15 09:30:00.
        let version = row.rsplit(',').next().unwrap();
        assert!(version.len() >= 19, "unexpected version field: {version}");
    }

    #[test]
    fn empty_evaluations_are_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.csv");
        let adapter = CsvReportAdapter;

        let result = adapter.write_evaluations(&[], path.to_str().unwrap());
        assert!(matches!(result, Err(GaptraderError::Report { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/out/signals.csv");
        let adapter = CsvReportAdapter;

        adapter.write_signals(&[], path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }
}
