use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tifft_data::{DataSource, Endpoints, FRED_API_URL, FRED_BASE_URL, STOOQ_BASE_URL};
use tifft_indicators::{BollingerConfig, IndicatorKind, IndicatorSpec, MacdConfig, RsiConfig};

/// Prefix of environment variable overrides, e.g. `TIFFT__DATA__SOURCE=stooq`.
pub const ENV_PREFIX: &str = "TIFFT";
const ENV_SEPARATOR: &str = "__";
const CONFIG_DIR: &str = "config";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataSettings,
    pub display: DisplaySettings,
    pub indicators: IndicatorSettings,
}

impl AppConfig {
    /// Renders the effective configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSettings {
    pub source: DataSource,
    pub api_key: Option<String>,
    pub fred_base_url: String,
    pub fred_api_url: String,
    pub stooq_base_url: String,
    pub timeout_secs: u64,
}

impl DataSettings {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            fred_base_url: self.fred_base_url.clone(),
            fred_api_url: self.fred_api_url.clone(),
            stooq_base_url: self.stooq_base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source: DataSource::default(),
            api_key: None,
            fred_base_url: FRED_BASE_URL.to_string(),
            fred_api_url: FRED_API_URL.to_string(),
            stooq_base_url: STOOQ_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplaySettings {
    /// Row cap for console tables; `0` shows every row.
    pub max_rows: Option<usize>,
    pub uppercase_headers: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_rows: Some(60),
            uppercase_headers: true,
        }
    }
}

/// Default parameters for each indicator kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndicatorSettings {
    pub bands: BollingerConfig,
    pub divergence: MacdConfig,
    pub oscillator: RsiConfig,
}

impl IndicatorSettings {
    /// The configured parameters for `kind`.
    pub fn spec_for(&self, kind: IndicatorKind) -> IndicatorSpec {
        match kind {
            IndicatorKind::Bands => IndicatorSpec::Bands(self.bands),
            IndicatorKind::Divergence => IndicatorSpec::Divergence(self.divergence),
            IndicatorKind::Oscillator => IndicatorSpec::Oscillator(self.oscillator),
        }
    }
}

/// Loads the configuration from `./config` and the process environment.
///
/// Layers, lowest precedence first: built-in defaults, `config/default.toml`,
/// `config/<env>.toml`, then `TIFFT__*` variables. Missing files are skipped.
pub fn load_config(env: Option<&str>) -> Result<AppConfig> {
    load_config_from(Path::new(CONFIG_DIR), env, None)
}

/// Same as [`load_config`] with an explicit directory, and optionally a fixed set of
/// variables in place of the process environment.
pub fn load_config_from(
    dir: &Path,
    env: Option<&str>,
    vars: Option<HashMap<String, String>>,
) -> Result<AppConfig> {
    let mut builder =
        Config::builder().add_source(File::from(dir.join("default")).required(false));
    if let Some(env) = env {
        builder = builder.add_source(File::from(dir.join(env)).required(false));
    }
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(vars),
    );
    builder
        .build()
        .context("failed to load configuration")?
        .try_deserialize()
        .context("invalid configuration")
}
