//! Relative Strength Index with Wilder's smoothing.
//!
//! - First average: simple mean of gains/losses over the first `period` changes
//! - Subsequent: avg = (prev_avg * (period - 1) + current) / period
//!
//! RSI = 100 * avg_gain / (avg_gain + avg_loss); a series that has not moved
//! at all reads 0. The first `period` bars have no value (warmup).

use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> Vec<Option<f64>> {
    let mut values: Vec<Option<f64>> = vec![None; bars.len()];
    if period == 0 || bars.len() <= period {
        return values;
    }

    let mut gains = Vec::with_capacity(bars.len() - 1);
    let mut losses = Vec::with_capacity(bars.len() - 1);
    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
    values[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..bars.len() {
        let change_idx = i - 1;
        avg_gain = (avg_gain * (period - 1) as f64 + gains[change_idx]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[change_idx]) / period as f64;
        values[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    values
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        0.0
    } else {
        100.0 * avg_gain / total
    }
}
