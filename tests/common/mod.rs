#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use gaptrader::domain::backtest::{Backtest, BacktestConfig, LongBacktest};
use gaptrader::domain::error::GaptraderError;
pub use gaptrader::domain::ohlcv::OhlcvBar;
use gaptrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub series: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.series.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_series(
        &self,
        _broker: &str,
        symbol: &str,
        _period: &str,
    ) -> Result<Vec<OhlcvBar>, GaptraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(GaptraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.series.get(symbol).cloned().unwrap_or_default())
    }

    fn list_symbols(&self, _broker: &str) -> Result<Vec<String>, GaptraderError> {
        let mut symbols: Vec<String> = self.series.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn make_bar(day: u64, open: f64, high: f64, low: f64, close: f64) -> OhlcvBar {
    OhlcvBar {
        date: date(2024, 1, 1).checked_add_days(Days::new(day)).unwrap(),
        open,
        high,
        low,
        close,
        volume: 1_000,
    }
}

pub fn make_series(rows: &[(f64, f64, f64, f64)]) -> Vec<OhlcvBar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| make_bar(i as u64, open, high, low, close))
        .collect()
}

pub fn long_engine() -> Box<dyn Backtest> {
    Box::new(LongBacktest::new(BacktestConfig::default()))
}

/// Forty bars: a flat base, a three-bar gapped rally, a stall that fades
/// through three bearish gaps, a dip below the rally's origin and a slow
/// recovery into new highs.
pub fn gapped_rally_series() -> Vec<OhlcvBar> {
    let mut rows: Vec<(f64, f64, f64, f64)> = Vec::new();
    for i in 0..15 {
        if i % 2 == 0 {
            rows.push((161.0, 161.7, 160.8, 161.4));
        } else {
            rows.push((161.4, 161.7, 160.8, 161.0));
        }
    }
    rows.extend([
        (161.5, 161.7, 160.9, 161.2),
        (162.0, 162.8, 161.9, 162.6),
        (163.0, 163.8, 162.9, 163.6),
        (164.0, 164.7, 163.9, 164.5),
        (164.7, 165.0, 164.6, 164.8),
        (164.9, 165.1, 164.2, 164.4),
        (164.5, 164.7, 163.8, 164.0),
        (164.2, 164.3, 163.7, 163.9),
        (163.8, 163.9, 163.2, 163.3),
        (163.05, 163.1, 162.9, 162.95),
        (163.0, 163.05, 162.85, 162.95),
        (162.3, 162.5, 161.2, 161.4),
        (161.5, 162.9, 161.0, 161.8),
        (161.9, 162.4, 161.3, 162.1),
        (162.2, 162.8, 161.8, 162.5),
        (162.6, 163.2, 162.2, 163.0),
        (163.1, 163.6, 162.7, 163.4),
        (163.5, 164.0, 163.1, 163.8),
        (163.9, 164.4, 163.5, 164.1),
        (164.2, 165.2, 164.0, 164.9),
        (164.8, 165.0, 164.3, 164.6),
        (164.5, 164.9, 164.2, 164.7),
        (164.6, 164.9, 164.1, 164.4),
        (164.3, 164.8, 164.0, 164.5),
        (164.4, 164.7, 164.1, 164.2),
    ]);
    make_series(&rows)
}
