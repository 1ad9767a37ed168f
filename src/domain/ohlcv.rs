//! OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// Close strictly above open.
    pub fn is_bullish_body(&self) -> bool {
        self.close > self.open
    }

    /// Close strictly below open.
    pub fn is_bearish_body(&self) -> bool {
        self.close < self.open
    }

    /// All four price fields are finite. Bars failing this carry no pattern.
    pub fn has_complete_prices(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
    }
}
