//! Data access port trait.

use crate::domain::error::GaptraderError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// Load the price series for one instrument, ordered ascending by date
    /// with no duplicate dates.
    fn fetch_series(
        &self,
        broker: &str,
        symbol: &str,
        period: &str,
    ) -> Result<Vec<OhlcvBar>, GaptraderError>;

    /// Instruments with cached data for the given broker, as
    /// `symbol_period` pairs.
    fn list_symbols(&self, broker: &str) -> Result<Vec<String>, GaptraderError>;
}
