//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod evaluator;
pub mod indicator;
pub mod ohlcv;
pub mod signal;
pub mod strategy;
