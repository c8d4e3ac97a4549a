use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, File};
use serde::Deserialize;
use serde_json::Value;

use crate::capability::TradingRules;
use crate::errors::{Error, Result};
use crate::host::{default_max_recent_trades, PaperHostInput};
use crate::market::CurrencyPair;
use crate::runner::RunnerConfig;

/// Prefix of environment variables overriding the file, e.g. `MSS__LOG__LEVEL`
pub const ENV_PREFIX: &str = "MSS";

/// Main configuration struct
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Strategy configuration (type, pair, params)
    pub strategy: StrategySettings,
    /// Paper host configuration
    #[serde(default)]
    pub paper: PaperSettings,
    /// Trading rules of the pair
    #[serde(default)]
    pub rules: TradingRules,
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerSettings,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize)]
pub struct StrategySettings {
    /// Strategy type name (e.g., "threshold", "noop")
    #[serde(rename = "type")]
    pub type_name: String,
    /// Currency pair to trade (e.g., "BTC_EUR", "ETH/BTC")
    pub pair: CurrencyPair,
    /// Strategy-specific parameters
    #[serde(default)]
    pub params: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct PaperSettings {
    /// Initially available amount per currency
    #[serde(default)]
    pub funds: HashMap<String, f64>,
    /// Size of the public trade buffer
    #[serde(default = "default_max_recent_trades")]
    pub max_recent_trades: usize,
}

impl Default for PaperSettings {
    fn default() -> Self {
        Self {
            funds: HashMap::new(),
            max_recent_trades: default_max_recent_trades(),
        }
    }
}

impl PaperSettings {
    /// Paper host input for `pair` with these funds
    pub fn host_input(&self, pair: &CurrencyPair) -> PaperHostInput {
        self.funds.iter().fold(
            PaperHostInput::new(pair.clone()).with_max_recent_trades(self.max_recent_trades),
            |input, (currency, amount)| input.with_funds(currency, *amount),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct RunnerSettings {
    /// Actions executed per drain (default 64)
    #[serde(default = "default_max_actions_per_event")]
    pub max_actions_per_event: usize,
    /// Seconds between periodic state saves (default 30)
    #[serde(default = "default_save_interval_secs")]
    pub save_interval_secs: u64,
    /// Where the strategy state is persisted; no persistence when absent
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_actions_per_event: default_max_actions_per_event(),
            save_interval_secs: default_save_interval_secs(),
            state_file: None,
        }
    }
}

impl RunnerSettings {
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            max_actions_per_event: self.max_actions_per_event,
            save_interval_secs: self.save_interval_secs,
        }
    }
}

fn default_max_actions_per_event() -> usize {
    64
}

fn default_save_interval_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings from a configuration file
    pub fn new(config_path: &str) -> Result<Self> {
        let s = Config::builder()
            .add_source(File::with_name(config_path))
            // Environment variables override the file
            // e.g. MSS__RUNNER__STATE_FILE=state.json
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = s.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.rules.validate()?;
        if self.runner.max_actions_per_event == 0 {
            return Err(Error::Parse(
                "runner.max_actions_per_event must be at least 1".into(),
            ));
        }
        if let Some((currency, amount)) = self.paper.funds.iter().find(|(_, a)| !(**a >= 0.0)) {
            return Err(Error::Parse(format!(
                "paper.funds.{} must not be negative, got {}",
                currency, amount
            )));
        }
        Ok(())
    }
}
