use std::env;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_DRAW_TABLE: &str = "pl5.csv";
pub const DEFAULT_REPORT_PATTERN: &str = "pl5_analysis_output_*.txt";
pub const DEFAULT_LEDGER_PATH: &str = "latest_pl5_calculation.txt";
pub const DEFAULT_MAX_NORMAL_RECORDS: usize = 10;
pub const DEFAULT_MAX_ERROR_LOGS: usize = 20;
pub const DEFAULT_DIRECT_PRIZE: u64 = 100_000;

/// Top-level configuration for the verifier.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub verifier: VerifierConfig,
    pub retention: RetentionLimits,
    pub prizes: PrizeTable,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let draw_table = env::var("PL5_DRAW_TABLE").unwrap_or_else(|_| DEFAULT_DRAW_TABLE.into());
        let report_dir = env::var("PL5_REPORT_DIR").unwrap_or_else(|_| ".".to_string());
        let report_pattern =
            env::var("PL5_REPORT_PATTERN").unwrap_or_else(|_| DEFAULT_REPORT_PATTERN.into());
        let ledger_path =
            env::var("PL5_LEDGER_PATH").unwrap_or_else(|_| DEFAULT_LEDGER_PATH.into());

        let max_normal = numeric_var("PL5_MAX_NORMAL_RECORDS", DEFAULT_MAX_NORMAL_RECORDS)?;
        let max_errors = numeric_var("PL5_MAX_ERROR_LOGS", DEFAULT_MAX_ERROR_LOGS)?;
        let direct_selection = numeric_var("PL5_DIRECT_PRIZE", DEFAULT_DIRECT_PRIZE)?;

        let log_level = env::var("PL5_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            verifier: VerifierConfig {
                draw_table: PathBuf::from(draw_table),
                report_dir: PathBuf::from(report_dir),
                report_pattern,
                ledger_path: PathBuf::from(ledger_path),
            },
            retention: RetentionLimits {
                max_normal,
                max_errors,
            },
            prizes: PrizeTable { direct_selection },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn numeric_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(default),
    }
}

/// Where the inputs live and where the ledger is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    pub draw_table: PathBuf,
    pub report_dir: PathBuf,
    /// Filename glob; `*` and `?` are the only wildcards.
    pub report_pattern: String,
    pub ledger_path: PathBuf,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            draw_table: PathBuf::from(DEFAULT_DRAW_TABLE),
            report_dir: PathBuf::from("."),
            report_pattern: DEFAULT_REPORT_PATTERN.to_string(),
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
        }
    }
}

/// Caps on the two ledger streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionLimits {
    pub max_normal: usize,
    pub max_errors: usize,
}

impl Default for RetentionLimits {
    fn default() -> Self {
        Self {
            max_normal: DEFAULT_MAX_NORMAL_RECORDS,
            max_errors: DEFAULT_MAX_ERROR_LOGS,
        }
    }
}

/// Prize amount (yuan) per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrizeTable {
    pub direct_selection: u64,
}

impl Default for PrizeTable {
    fn default() -> Self {
        Self {
            direct_selection: DEFAULT_DIRECT_PRIZE,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
