//! Domain error types.

/// Top-level error type for altrader.
#[derive(Debug, thiserror::Error)]
pub enum AlTraderError {
    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("store query error: {reason}")]
    StoreQuery { reason: String },

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

    #[error("no price data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("integrity error: {reason}")]
    Integrity { reason: String },

    #[error("trade rejected for {ticker}: {reason}")]
    Trade { ticker: String, reason: String },

    #[error("remote sync failed: {reason}")]
    Sync { reason: String },

    #[error("notification failed: {reason}")]
    Notify { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AlTraderError {
    /// Errors confined to a single ticker. The run loop logs these and holds
    /// the ticker instead of aborting the run.
    pub fn is_ticker_local(&self) -> bool {
        matches!(
            self,
            AlTraderError::NoData { .. }
                | AlTraderError::InsufficientData { .. }
                | AlTraderError::Trade { .. }
        )
    }
}

impl From<&AlTraderError> for std::process::ExitCode {
    fn from(err: &AlTraderError) -> Self {
        let code: u8 = match err {
            AlTraderError::Io(_) => 1,
            AlTraderError::ConfigParse { .. }
            | AlTraderError::ConfigMissing { .. }
            | AlTraderError::ConfigInvalid { .. } => 2,
            AlTraderError::Store { .. } | AlTraderError::StoreQuery { .. } => 3,
            AlTraderError::Integrity { .. } | AlTraderError::Trade { .. } => 4,
            AlTraderError::NoData { .. } | AlTraderError::InsufficientData { .. } => 5,
            AlTraderError::Sync { .. } | AlTraderError::Notify { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
