//! CSV file data adapter.
//!
//! Series live under `<base>/<broker>/<symbol>_<period>.csv` with columns
//! `date,open,high,low,close,volume`. Broker exports sometimes arrive
//! newest-first; such files are reversed on load. Any other ordering is
//! an error.

use crate::domain::error::GaptraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvDataAdapter {
    base_path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn series_path(&self, broker: &str, symbol: &str, period: &str) -> PathBuf {
        self.base_path
            .join(broker)
            .join(format!("{}_{}.csv", symbol, period))
    }

    /// Empty price fields read as NaN, matching broker exports with
    /// missing quotes; downstream guards skip such bars.
    fn parse_price(field: &str, column: &str) -> Result<f64, GaptraderError> {
        if field.is_empty() {
            return Ok(f64::NAN);
        }
        field.parse().map_err(|e| GaptraderError::Data {
            reason: format!("invalid {} value '{}': {}", column, field, e),
        })
    }
}

impl DataPort for CsvDataAdapter {
    fn fetch_series(
        &self,
        broker: &str,
        symbol: &str,
        period: &str,
    ) -> Result<Vec<OhlcvBar>, GaptraderError> {
        let path = self.series_path(broker, symbol, period);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GaptraderError::NoData {
                    broker: broker.to_string(),
                    symbol: symbol.to_string(),
                    period: period.to_string(),
                });
            }
            Err(e) => {
                return Err(GaptraderError::Data {
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| GaptraderError::Data {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let field = |index: usize, column: &str| {
                record.get(index).ok_or_else(|| GaptraderError::Data {
                    reason: format!("missing {} column in {}", column, path.display()),
                })
            };

            let date = NaiveDate::parse_from_str(field(0, "date")?, "%Y-%m-%d").map_err(|e| {
                GaptraderError::Data {
                    reason: format!("invalid date in {}: {}", path.display(), e),
                }
            })?;
            let open = Self::parse_price(field(1, "open")?, "open")?;
            let high = Self::parse_price(field(2, "high")?, "high")?;
            let low = Self::parse_price(field(3, "low")?, "low")?;
            let close = Self::parse_price(field(4, "close")?, "close")?;
            let volume_field = field(5, "volume")?;
            let volume: i64 = if volume_field.is_empty() {
                0
            } else {
                volume_field.parse().map_err(|e| GaptraderError::Data {
                    reason: format!("invalid volume value '{}': {}", volume_field, e),
                })?
            };

            bars.push(OhlcvBar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        if bars.len() >= 2 && bars[0].date > bars[1].date {
            bars.reverse();
        }
        for pair in bars.windows(2) {
            if pair[0].date >= pair[1].date {
                return Err(GaptraderError::Data {
                    reason: format!(
                        "{} is not in date order: {} is not before {}",
                        path.display(),
                        pair[0].date,
                        pair[1].date
                    ),
                });
            }
        }

        Ok(bars)
    }

    fn list_symbols(&self, broker: &str) -> Result<Vec<String>, GaptraderError> {
        let dir = self.base_path.join(broker);
        let entries = fs::read_dir(&dir).map_err(|e| GaptraderError::Data {
            reason: format!("failed to read directory {}: {}", dir.display(), e),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GaptraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(stem) = name_str.strip_suffix(".csv") {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
