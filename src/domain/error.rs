//! Domain error types.

/// Top-level error type for tbtrader.
#[derive(Debug, thiserror::Error)]
pub enum TbtraderError {
    #[error("data source error: {reason}")]
    DataSource { reason: String },

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

    #[error("insufficient index history: have {points} points, need {minimum}")]
    InsufficientIndexHistory { points: usize, minimum: usize },

    #[error("no risk-free returns before trade date")]
    NoRiskFreeData,

    #[error("missing or extraneous datapoints for {symbol} on {date}")]
    MismatchedDates {
        symbol: String,
        date: chrono::NaiveDate,
    },

    #[error("insufficient data for {symbol}: have {points} aligned points, need {minimum}")]
    InsufficientData {
        symbol: String,
        points: usize,
        minimum: usize,
    },

    #[error("degenerate regression for {symbol}: index returns have zero variance")]
    DegenerateRegression { symbol: String },

    #[error("no regression results for {symbol}")]
    NoRegressionResults { symbol: String },

    #[error("could not compute allocation after {attempts} tries")]
    NonConvergence { attempts: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TbtraderError {
    /// True for the per-day alignment conditions a backtest driver may
    /// recover from by skipping the day.
    pub fn is_data_gap(&self) -> bool {
        matches!(
            self,
            TbtraderError::MismatchedDates { .. } | TbtraderError::InsufficientData { .. }
        )
    }
}

impl From<&TbtraderError> for std::process::ExitCode {
    fn from(err: &TbtraderError) -> Self {
        let code: u8 = match err {
            TbtraderError::Io(_) => 1,
            TbtraderError::ConfigParse { .. }
            | TbtraderError::ConfigMissing { .. }
            | TbtraderError::ConfigInvalid { .. } => 2,
            TbtraderError::DataSource { .. } => 3,
            TbtraderError::InsufficientIndexHistory { .. }
            | TbtraderError::NoRiskFreeData
            | TbtraderError::MismatchedDates { .. }
            | TbtraderError::InsufficientData { .. }
            | TbtraderError::DegenerateRegression { .. }
            | TbtraderError::NoRegressionResults { .. } => 4,
            TbtraderError::NonConvergence { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
