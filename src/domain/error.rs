//! Domain error types.

/// Top-level error type for gaptrader.
#[derive(Debug, thiserror::Error)]
pub enum GaptraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol} {period} from {broker}")]
    NoData {
        broker: String,
        symbol: String,
        period: String,
    },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid parameters: {reason}")]
    Params { reason: String },

    #[error("signal at bar {index} fills at the next open but the series ends at bar {last}")]
    FillOutOfRange { index: usize, last: usize },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&GaptraderError> for std::process::ExitCode {
    fn from(err: &GaptraderError) -> Self {
        let code: u8 = match err {
            GaptraderError::Io(_) => 1,
            GaptraderError::ConfigParse { .. }
            | GaptraderError::ConfigMissing { .. }
            | GaptraderError::ConfigInvalid { .. } => 2,
            GaptraderError::Data { .. } | GaptraderError::NoData { .. } => 3,
            GaptraderError::Params { .. } => 4,
            GaptraderError::FillOutOfRange { .. } | GaptraderError::Report { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
