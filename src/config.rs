use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::models::LicenseType;

/// Default minimum confidence to accept a template match.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.9;

/// Root configuration structure, deserialized from `.license-walk/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    /// Package import path → license type name. Validated by [`parse_overrides`].
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    #[serde(default)]
    pub check: CheckConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanConfig {
    pub confidence_threshold: Option<f64>,
    /// Directory holding the reference corpus `index.toml`.
    pub corpus: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckConfig {
    /// License type names that fail the check. Defaults to `["Forbidden"]`.
    pub disallowed: Option<Vec<String>>,
}

/// Load the configuration file, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<dir>/.license-walk/config.toml`
/// 3. `~/.config/license-walk/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(dir: &Path, config_override: Option<&Path>) -> Result<Config, ConfigError> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = dir.join(".license-walk").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".config").join("license-walk").join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    debug!("no config file found, using defaults");
    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    info!(path = %path.display(), "loading config");
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Validated, immutable per-package license type overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides(HashMap<String, LicenseType>);

impl Overrides {
    pub fn get(&self, import_path: &str) -> Option<LicenseType> {
        self.0.get(import_path).copied()
    }
}

/// Validate user-supplied overrides.
///
/// Entries are checked in key order; the first value that is not one of
/// [`LicenseType::ASSIGNABLE`] fails the whole table.
pub fn parse_overrides(raw: &BTreeMap<String, String>) -> Result<Overrides, ConfigError> {
    let mut table = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        let license_type =
            value
                .parse::<LicenseType>()
                .map_err(|_| ConfigError::InvalidOverrideValue {
                    key: key.clone(),
                    value: value.clone(),
                    allowed: LicenseType::assignable_list(),
                })?;
        table.insert(key.clone(), license_type);
    }
    Ok(Overrides(table))
}

/// Split a repeatable `path=Type` CLI entry.
pub fn parse_override_arg(arg: &str) -> Result<(String, String), ConfigError> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ConfigError::MalformedOverride(arg.to_string())),
    }
}

pub fn validate_threshold(threshold: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ConfigError::ThresholdOutOfRange(threshold))
    }
}

/// Values supplied on the command line; each one wins over the config file.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub confidence_threshold: Option<f64>,
    pub corpus: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub overrides: Vec<String>,
    pub disallowed: Vec<String>,
}

/// Effective run configuration, built once before the walk and shared read-only.
#[derive(Debug, Clone)]
pub struct Settings {
    pub confidence_threshold: f64,
    pub corpus: PathBuf,
    pub jobs: usize,
    pub timeout: Option<Duration>,
    pub overrides: Overrides,
    pub disallowed: Vec<LicenseType>,
}

impl Settings {
    pub fn resolve(config: Config, cli: CliSettings) -> Result<Settings, ConfigError> {
        let confidence_threshold = validate_threshold(
            cli.confidence_threshold
                .or(config.scan.confidence_threshold)
                .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
        )?;

        let corpus = cli
            .corpus
            .or(config.scan.corpus)
            .ok_or(ConfigError::MissingCorpus)?;

        let jobs = match cli.jobs.or(config.scan.jobs) {
            Some(0) => return Err(ConfigError::InvalidJobs),
            Some(n) => n,
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        };

        let mut raw_overrides = config.overrides;
        for arg in &cli.overrides {
            let (key, value) = parse_override_arg(arg)?;
            raw_overrides.insert(key, value);
        }
        let overrides = parse_overrides(&raw_overrides)?;

        let disallowed_names = if cli.disallowed.is_empty() {
            config
                .check
                .disallowed
                .unwrap_or_else(|| vec![LicenseType::Forbidden.to_string()])
        } else {
            cli.disallowed
        };
        let disallowed = disallowed_names
            .iter()
            .map(|name| {
                name.parse::<LicenseType>()
                    .map_err(|_| ConfigError::InvalidDisallowedType {
                        value: name.clone(),
                        allowed: LicenseType::assignable_list(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let settings = Settings {
            confidence_threshold,
            corpus,
            jobs,
            timeout: cli
                .timeout_secs
                .or(config.scan.timeout_secs)
                .map(Duration::from_secs),
            overrides,
            disallowed,
        };
        debug!(?settings, "resolved settings");
        Ok(settings)
    }
}
