//! Price-gap detection.
//!
//! A bar is labeled when its neighbors leave an untraded price zone:
//! - Bullish: high[i-1] < low[i+1] and the bar closes above its open.
//!   Zone bounds: lower = high[i-1], upper = low[i+1].
//! - Bearish: low[i-1] > high[i+1] and the bar closes below its open.
//!   Zone bounds: lower = high[i+1], upper = low[i-1].
//!
//! Boundary bars cannot be labeled (the scan reads neighbors at offset
//! -1/+1). Bars with non-finite prices in any inspected field are left
//! unlabeled; that is a valid "no pattern" outcome, not an error.
//!
//! After detection, consecutive same-direction labels are optionally
//! collapsed per [`MergeMode`], each surviving label gets a run rank, and a
//! forward scan records the first bar whose price re-enters each zone.

use crate::domain::indicator::{GapDirection, GapLabel, MergeMode};
use crate::domain::ohlcv::OhlcvBar;

/// Label every bar of the series. Output is aligned 1:1 with the input;
/// calling this twice on the same input yields identical output.
pub fn calculate_gaps(bars: &[OhlcvBar], merge: MergeMode) -> Vec<Option<GapLabel>> {
    let mut labels: Vec<Option<GapLabel>> = vec![None; bars.len()];
    if bars.len() < 3 {
        return labels;
    }

    for i in 1..bars.len() - 1 {
        let prev = &bars[i - 1];
        let cur = &bars[i];
        let next = &bars[i + 1];
        if !prev.has_complete_prices()
            || !cur.has_complete_prices()
            || !next.has_complete_prices()
        {
            continue;
        }

        if prev.high < next.low && cur.is_bullish_body() {
            labels[i] = Some(GapLabel {
                direction: GapDirection::Bullish,
                lower: prev.high,
                upper: next.low,
                rank: 1,
                mitigated_at: None,
            });
        } else if prev.low > next.high && cur.is_bearish_body() {
            labels[i] = Some(GapLabel {
                direction: GapDirection::Bearish,
                lower: next.high,
                upper: prev.low,
                rank: 1,
                mitigated_at: None,
            });
        }
    }

    match merge {
        MergeMode::None => {}
        MergeMode::ToStart => merge_to_start(&mut labels),
        MergeMode::ToEnd => merge_to_end(&mut labels),
    }

    assign_ranks(&mut labels);
    mark_mitigations(bars, &mut labels);
    labels
}

/// Fold each run of same-direction labels onto its earliest bar, taking the
/// union of the zone bounds. Scans right to left so the accumulated union
/// propagates to the run start.
fn merge_to_start(labels: &mut [Option<GapLabel>]) {
    for i in (0..labels.len().saturating_sub(1)).rev() {
        let Some(next) = labels[i + 1].clone() else {
            continue;
        };
        let Some(cur) = labels[i].as_mut() else {
            continue;
        };
        if cur.direction != next.direction {
            continue;
        }
        cur.lower = cur.lower.min(next.lower);
        cur.upper = cur.upper.max(next.upper);
        labels[i + 1] = None;
    }
}

/// Mirror of [`merge_to_start`]: fold each run onto its latest bar.
fn merge_to_end(labels: &mut [Option<GapLabel>]) {
    for i in 0..labels.len().saturating_sub(1) {
        let Some(cur) = labels[i].clone() else {
            continue;
        };
        let Some(next) = labels[i + 1].as_mut() else {
            continue;
        };
        if next.direction != cur.direction {
            continue;
        }
        next.lower = next.lower.min(cur.lower);
        next.upper = next.upper.max(cur.upper);
        labels[i] = None;
    }
}

/// Rank is 1 for the first label of a run and increments while the previous
/// bar carries a same-direction label. Runs collapsed by merging therefore
/// rank 1.
fn assign_ranks(labels: &mut [Option<GapLabel>]) {
    let mut prev: Option<(GapDirection, u32)> = None;
    for slot in labels.iter_mut() {
        match slot {
            Some(label) => {
                label.rank = match prev {
                    Some((direction, rank)) if direction == label.direction => rank + 1,
                    _ => 1,
                };
                prev = Some((label.direction, label.rank));
            }
            None => prev = None,
        }
    }
}

/// A bullish zone is mitigated by the first bar from i+2 onward whose low
/// falls back to the upper bound; a bearish zone by the first high that
/// climbs back to the lower bound.
fn mark_mitigations(bars: &[OhlcvBar], labels: &mut [Option<GapLabel>]) {
    for i in 0..labels.len() {
        let (direction, lower, upper) = match &labels[i] {
            Some(label) => (label.direction, label.lower, label.upper),
            None => continue,
        };
        let hit = bars
            .iter()
            .enumerate()
            .skip(i + 2)
            .find(|(_, bar)| match direction {
                GapDirection::Bullish => bar.low <= upper,
                GapDirection::Bearish => bar.high >= lower,
            })
            .map(|(j, _)| j);
        if let Some(label) = labels[i].as_mut() {
            label.mitigated_at = hit;
        }
    }
}
