//! Configuration validation.
//!
//! Every config section is checked up front so a bad value fails the run
//! before any data is loaded.

use crate::domain::backtest::EngineKind;
use crate::domain::error::GaptraderError;
use crate::domain::indicator::MergeMode;
use crate::domain::strategy::StrategyKind;
use crate::domain::strategy::gap::BreakoutTrigger;
use crate::ports::config_port::ConfigPort;

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    require_string(config, "data", "base_path")?;
    require_string(config, "data", "broker")?;
    require_string(config, "data", "symbol")?;
    require_string(config, "data", "period")?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    match strategy_kind(config)? {
        StrategyKind::Gap => validate_gap_params(config),
        StrategyKind::Rsi => validate_rsi_params(config),
        StrategyKind::Random => validate_seed(config),
    }
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    validate_engine(config)?;
    validate_initial_capital(config)?;
    validate_trade_percentage(config)?;
    validate_fee(config)?;
    Ok(())
}

/// Grid lists are only checked for shape here; each combination's values
/// are range-checked when the strategy for that combination is built.
pub fn validate_grid_config(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    check_float_list(config, "stop_loss")?;
    check_float_list(config, "take_profit")?;
    check_float_list(config, "min_gap_pct")?;
    check_float_list(config, "rsi_oversold")?;
    check_float_list(config, "rsi_overbought")?;
    check_usize_list(config, "retention_period")?;
    check_usize_list(config, "min_rank")?;
    check_usize_list(config, "rsi_window")?;
    check_merge_list(config, "merge")?;
    check_trigger_list(config, "breakout_trigger")?;

    let top_n = config.get_int("grid", "top_n", 10);
    if top_n < 1 {
        return Err(GaptraderError::ConfigInvalid {
            section: "grid".to_string(),
            key: "top_n".to_string(),
            reason: "top_n must be at least 1".to_string(),
        });
    }
    Ok(())
}

pub fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, GaptraderError> {
    let name = config
        .get_string("strategy", "kind")
        .unwrap_or_else(|| "gap".to_string());
    StrategyKind::from_name(&name).ok_or_else(|| GaptraderError::ConfigInvalid {
        section: "strategy".to_string(),
        key: "kind".to_string(),
        reason: format!("unknown strategy '{}', expected gap, rsi or random", name),
    })
}

pub fn engine_kind(config: &dyn ConfigPort) -> Result<EngineKind, GaptraderError> {
    let name = config
        .get_string("backtest", "engine")
        .unwrap_or_else(|| "long".to_string());
    EngineKind::from_name(&name).ok_or_else(|| GaptraderError::ConfigInvalid {
        section: "backtest".to_string(),
        key: "engine".to_string(),
        reason: format!("unknown engine '{}', expected long or long-short", name),
    })
}

pub fn merge_mode(config: &dyn ConfigPort) -> Result<MergeMode, GaptraderError> {
    let name = config
        .get_string("strategy", "merge")
        .unwrap_or_else(|| "none".to_string());
    MergeMode::from_name(&name).ok_or_else(|| GaptraderError::ConfigInvalid {
        section: "strategy".to_string(),
        key: "merge".to_string(),
        reason: format!("unknown merge mode '{}', expected none, to-start or to-end", name),
    })
}

pub fn breakout_trigger(config: &dyn ConfigPort) -> Result<BreakoutTrigger, GaptraderError> {
    let name = config
        .get_string("strategy", "breakout_trigger")
        .unwrap_or_else(|| "upper-bound".to_string());
    BreakoutTrigger::from_name(&name).ok_or_else(|| GaptraderError::ConfigInvalid {
        section: "strategy".to_string(),
        key: "breakout_trigger".to_string(),
        reason: format!(
            "unknown trigger '{}', expected upper-bound or lower-bound",
            name
        ),
    })
}

fn validate_gap_params(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    let merge = merge_mode(config)?;
    breakout_trigger(config)?;

    let retention = config.get_int("strategy", "retention_period", 100);
    if retention < 1 {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "retention_period".to_string(),
            reason: "retention_period must be at least 1".to_string(),
        });
    }

    let min_gap_pct = config.get_double("strategy", "min_gap_pct", 0.1);
    if min_gap_pct < 0.0 {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "min_gap_pct".to_string(),
            reason: "min_gap_pct must be non-negative".to_string(),
        });
    }

    let min_rank = config.get_int("strategy", "min_rank", 1);
    if min_rank < 1 {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "min_rank".to_string(),
            reason: "min_rank must be at least 1".to_string(),
        });
    }
    if min_rank > 1 && merge != MergeMode::None {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "min_rank".to_string(),
            reason: "min_rank above 1 requires merge = none; merged runs always rank 1"
                .to_string(),
        });
    }

    validate_exit_levels(config)
}

fn validate_rsi_params(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    let window = config.get_int("strategy", "rsi_window", 14);
    if window < 1 {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "rsi_window".to_string(),
            reason: "rsi_window must be at least 1".to_string(),
        });
    }

    let oversold = config.get_double("strategy", "rsi_oversold", 30.0);
    let overbought = config.get_double("strategy", "rsi_overbought", 70.0);
    if oversold < 0.0 {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "rsi_oversold".to_string(),
            reason: "rsi_oversold must be non-negative".to_string(),
        });
    }
    if overbought > 100.0 {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "rsi_overbought".to_string(),
            reason: "rsi_overbought cannot exceed 100".to_string(),
        });
    }
    if oversold >= overbought {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "rsi_oversold".to_string(),
            reason: "rsi_oversold must be below rsi_overbought".to_string(),
        });
    }

    validate_exit_levels(config)
}

fn validate_seed(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    let seed = config.get_int("strategy", "seed", 123);
    if seed < 0 {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "seed".to_string(),
            reason: "seed must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_exit_levels(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    let stop_loss = config.get_double("strategy", "stop_loss", 0.05);
    if stop_loss <= 0.0 || stop_loss >= 1.0 {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "stop_loss".to_string(),
            reason: "stop_loss must be between 0 and 1".to_string(),
        });
    }

    let take_profit = config.get_double("strategy", "take_profit", 0.1);
    if take_profit <= 0.0 {
        return Err(GaptraderError::ConfigInvalid {
            section: "strategy".to_string(),
            key: "take_profit".to_string(),
            reason: "take_profit must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_engine(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    engine_kind(config).map(|_| ())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    let value = config.get_double("backtest", "initial_capital", 1_000.0);
    if value <= 0.0 {
        return Err(GaptraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_trade_percentage(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    let value = config.get_double("backtest", "trade_percentage", 0.02);
    if value <= 0.0 || value > 1.0 {
        return Err(GaptraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "trade_percentage".to_string(),
            reason: "trade_percentage must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_fee(config: &dyn ConfigPort) -> Result<(), GaptraderError> {
    let value = config.get_double("backtest", "fee", 0.0);
    if value < 0.0 {
        return Err(GaptraderError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "fee".to_string(),
            reason: "fee must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), GaptraderError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(GaptraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

pub fn parse_float_list(raw: &str) -> Option<Vec<f64>> {
    let values: Result<Vec<f64>, _> = raw
        .split(',')
        .map(|item| item.trim().parse::<f64>())
        .collect();
    values.ok().filter(|list| !list.is_empty())
}

pub fn parse_usize_list(raw: &str) -> Option<Vec<usize>> {
    let values: Result<Vec<usize>, _> = raw
        .split(',')
        .map(|item| item.trim().parse::<usize>())
        .collect();
    values.ok().filter(|list| !list.is_empty())
}

pub fn parse_merge_list(raw: &str) -> Option<Vec<MergeMode>> {
    let values: Option<Vec<MergeMode>> = raw
        .split(',')
        .map(|item| MergeMode::from_name(item.trim()))
        .collect();
    values.filter(|list| !list.is_empty())
}

/// Parses a comma-separated list of breakout trigger names.
pub fn parse_trigger_list(raw: &str) -> Option<Vec<BreakoutTrigger>> {
    let values: Option<Vec<BreakoutTrigger>> = raw
        .split(',')
        .map(|item| BreakoutTrigger::from_name(item.trim()))
        .collect();
    values.filter(|list| !list.is_empty())
}

fn check_float_list(config: &dyn ConfigPort, key: &str) -> Result<(), GaptraderError> {
    match config.get_string("grid", key) {
        None => Ok(()),
        Some(raw) if parse_float_list(&raw).is_some() => Ok(()),
        Some(raw) => Err(GaptraderError::ConfigInvalid {
            section: "grid".to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a comma-separated list of numbers", raw),
        }),
    }
}

fn check_usize_list(config: &dyn ConfigPort, key: &str) -> Result<(), GaptraderError> {
    match config.get_string("grid", key) {
        None => Ok(()),
        Some(raw) if parse_usize_list(&raw).is_some() => Ok(()),
        Some(raw) => Err(GaptraderError::ConfigInvalid {
            section: "grid".to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a comma-separated list of whole numbers", raw),
        }),
    }
}

fn check_merge_list(config: &dyn ConfigPort, key: &str) -> Result<(), GaptraderError> {
    match config.get_string("grid", key) {
        None => Ok(()),
        Some(raw) if parse_merge_list(&raw).is_some() => Ok(()),
        Some(raw) => Err(GaptraderError::ConfigInvalid {
            section: "grid".to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a comma-separated list of merge modes", raw),
        }),
    }
}

fn check_trigger_list(config: &dyn ConfigPort, key: &str) -> Result<(), GaptraderError> {
    match config.get_string("grid", key) {
        None => Ok(()),
        Some(raw) if parse_trigger_list(&raw).is_some() => Ok(()),
        Some(raw) => Err(GaptraderError::ConfigInvalid {
            section: "grid".to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a comma-separated list of trigger names", raw),
        }),
    }
}
