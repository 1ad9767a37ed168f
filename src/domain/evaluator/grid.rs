//! Parameter grids expanded into exhaustive combination lists.

use crate::domain::indicator::MergeMode;
use crate::domain::strategy::gap::{BreakoutTrigger, GapParams};
use crate::domain::strategy::rsi::RsiParams;

/// Value lists for every tunable of the gap strategy.
#[derive(Debug, Clone)]
pub struct GapParamGrid {
    pub stop_loss: Vec<f64>,
    pub take_profit: Vec<f64>,
    pub retention_period: Vec<usize>,
    pub min_gap_pct: Vec<f64>,
    pub merge: Vec<MergeMode>,
    pub min_rank: Vec<u32>,
    pub breakout_trigger: Vec<BreakoutTrigger>,
}

impl Default for GapParamGrid {
    fn default() -> Self {
        let base = GapParams::default();
        GapParamGrid {
            stop_loss: vec![base.stop_loss_pct],
            take_profit: vec![base.take_profit_pct],
            retention_period: vec![base.retention_period],
            min_gap_pct: vec![base.min_gap_pct],
            merge: vec![base.merge],
            min_rank: vec![base.min_rank],
            breakout_trigger: vec![base.breakout_trigger],
        }
    }
}

impl GapParamGrid {
    pub fn combinations(&self) -> Vec<GapParams> {
        let mut combos = Vec::new();
        for &stop_loss_pct in &self.stop_loss {
            for &take_profit_pct in &self.take_profit {
                for &retention_period in &self.retention_period {
                    for &min_gap_pct in &self.min_gap_pct {
                        for &merge in &self.merge {
                            for &min_rank in &self.min_rank {
                                for &breakout_trigger in &self.breakout_trigger {
                                    combos.push(GapParams {
                                        merge,
                                        retention_period,
                                        min_gap_pct,
                                        min_rank,
                                        breakout_trigger,
                                        stop_loss_pct,
                                        take_profit_pct,
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
        combos
    }
}

/// Value lists for every tunable of the RSI strategy.
#[derive(Debug, Clone)]
pub struct RsiParamGrid {
    pub stop_loss: Vec<f64>,
    pub take_profit: Vec<f64>,
    pub window: Vec<usize>,
    pub overbought: Vec<f64>,
    pub oversold: Vec<f64>,
}

impl Default for RsiParamGrid {
    fn default() -> Self {
        let base = RsiParams::default();
        RsiParamGrid {
            stop_loss: vec![base.stop_loss_pct],
            take_profit: vec![base.take_profit_pct],
            window: vec![base.window],
            overbought: vec![base.overbought],
            oversold: vec![base.oversold],
        }
    }
}

impl RsiParamGrid {
    pub fn combinations(&self) -> Vec<RsiParams> {
        let mut combos = Vec::new();
        for &stop_loss_pct in &self.stop_loss {
            for &take_profit_pct in &self.take_profit {
                for &window in &self.window {
                    for &overbought in &self.overbought {
                        for &oversold in &self.oversold {
                            combos.push(RsiParams {
                                window,
                                overbought,
                                oversold,
                                stop_loss_pct,
                                take_profit_pct,
                            });
                        }
                    }
                }
            }
        }
        combos
    }
}
