//! Provides a ConfigManager to read, validate and refresh settings from a file.
//!

use color_eyre::Result;
use log::*;
use notify::{RecommendedWatcher, Watcher};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    error::ConfigError,
    event::{AppEvent, Event},
    sample::{
        CounterValue, ProcessId,
        format::HotThresholds,
        rank::{IdlePolicy, Metric, RankRequest, UnderflowPolicy},
    },
};

pub const DEFAULT_FILE: &str = "proctop.toml";

/// Sampling faster than this is raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_secs(3);

/// Settings as written in the file, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProctopConfig {
    #[serde(default = "default_top_n")]
    pub top_n: i64,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_exclude_idle")]
    pub exclude_idle: bool,
    #[serde(default)]
    pub idle_pid: u32,
    #[serde(default = "default_underflow")]
    pub underflow: String,
    #[serde(default = "default_hot_cpu_percent")]
    pub hot_cpu_percent: f64,
    #[serde(default = "default_hot_memory_mb")]
    pub hot_memory_mb: u64,
    #[serde(default = "default_hot_io_kb_per_sec")]
    pub hot_io_kb_per_sec: u64,
}

fn default_top_n() -> i64 {
    3
}

fn default_interval_secs() -> f64 {
    MIN_INTERVAL.as_secs_f64()
}

fn default_metric() -> String {
    Metric::default().name().to_string()
}

fn default_exclude_idle() -> bool {
    true
}

fn default_underflow() -> String {
    UnderflowPolicy::default().to_string()
}

fn default_hot_cpu_percent() -> f64 {
    50.0
}

fn default_hot_memory_mb() -> u64 {
    1024
}

fn default_hot_io_kb_per_sec() -> u64 {
    10 * 1024
}

impl Default for ProctopConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            interval_secs: default_interval_secs(),
            metric: default_metric(),
            exclude_idle: default_exclude_idle(),
            idle_pid: 0,
            underflow: default_underflow(),
            hot_cpu_percent: default_hot_cpu_percent(),
            hot_memory_mb: default_hot_memory_mb(),
            hot_io_kb_per_sec: default_hot_io_kb_per_sec(),
        }
    }
}

/// Validated settings, the only form a sampling cycle ever sees.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub top_n: usize,
    pub interval: Duration,
    pub metric: Metric,
    pub idle: IdlePolicy,
    pub underflow: UnderflowPolicy,
    pub hot: HotThresholds,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_n: 3,
            interval: MIN_INTERVAL,
            metric: Metric::default(),
            idle: IdlePolicy::default(),
            underflow: UnderflowPolicy::default(),
            hot: HotThresholds::default(),
        }
    }
}

impl Settings {
    pub fn request(&self) -> RankRequest {
        RankRequest {
            metric: self.metric,
            top_n: self.top_n,
            interval: self.interval,
            idle: self.idle,
            underflow: self.underflow,
        }
    }
}

impl ProctopConfig {
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let top_n = usize::try_from(self.top_n)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ConfigError::InvalidTopN(self.top_n))?;

        if !self.interval_secs.is_finite() || self.interval_secs <= 0.0 {
            return Err(ConfigError::InvalidInterval(self.interval_secs));
        }
        let mut interval = Duration::try_from_secs_f64(self.interval_secs)
            .map_err(|_| ConfigError::InvalidInterval(self.interval_secs))?;
        if interval < MIN_INTERVAL {
            warn!(
                target: "Config",
                "interval_secs {} is below the minimum, using {}s",
                self.interval_secs,
                MIN_INTERVAL.as_secs()
            );
            interval = MIN_INTERVAL;
        }

        if !(0.0..=100.0).contains(&self.hot_cpu_percent) {
            return Err(ConfigError::InvalidHotThreshold(self.hot_cpu_percent));
        }

        Ok(Settings {
            top_n,
            interval,
            metric: self.metric.parse()?,
            idle: IdlePolicy {
                exclude: self.exclude_idle,
                sentinel: ProcessId(self.idle_pid),
            },
            underflow: self.underflow.parse()?,
            hot: HotThresholds {
                cpu_percent: self.hot_cpu_percent,
                memory_bytes: CounterValue::new(self.hot_memory_mb as u128 * 1024 * 1024),
                io_bytes_per_second: CounterValue::new(self.hot_io_kb_per_sec as u128 * 1024),
            },
        })
    }
}

#[derive(Debug)]
pub struct ConfigManager {
    pub file_path: PathBuf,
    settings: Settings,
    _watcher: Option<RecommendedWatcher>,
}

impl ConfigManager {
    pub fn new(file_path: PathBuf, sender: UnboundedSender<Event>) -> Result<ConfigManager> {
        let settings = load_from_file(&file_path)?.validate()?;
        let watcher = if file_path.exists() {
            let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                if let Ok(event) = res
                    && (event.kind.is_modify() || event.kind.is_create())
                {
                    let _ = sender.send(Event::App(AppEvent::Reload));
                }
            })?;
            info!(target: "Config", "Watching file {:?}", file_path);
            watcher.watch(&file_path, notify::RecursiveMode::NonRecursive)?;
            Some(watcher)
        } else {
            info!(target: "Config", "No file at {:?}, using defaults", file_path);
            None
        };
        Ok(ConfigManager {
            file_path,
            settings,
            _watcher: watcher,
        })
    }

    pub fn current(&self) -> Settings {
        self.settings.clone()
    }

    /// Re-read the file. Invalid settings are rejected and the previous
    /// ones stay in force.
    pub fn reload(&mut self) -> Result<Settings, ConfigError> {
        self.settings = load_from_file(&self.file_path)?.validate()?;
        info!(target: "Config", "Reloaded {:?}", self.file_path);
        Ok(self.current())
    }
}

/// Read the file (optional) layered with `PROCTOP_*` environment variables.
pub fn load_from_file(file_path: &Path) -> Result<ProctopConfig, ConfigError> {
    load(file_path, environment())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("PROCTOP").try_parsing(true)
}

fn load(file_path: &Path, environment: config::Environment) -> Result<ProctopConfig, ConfigError> {
    let raw = config::Config::builder()
        .add_source(config::File::from(file_path).required(false))
        .add_source(environment)
        .build()?;
    Ok(raw.try_deserialize()?)
}

/// The default configuration as TOML, for `proctop init`.
pub fn default_toml() -> Result<String> {
    Ok(toml::to_string_pretty(&ProctopConfig::default())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("proctop-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_validate() {
        let settings = ProctopConfig::default().validate().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.request().top_n, 3);
    }

    #[test]
    fn short_intervals_are_raised_to_the_minimum() {
        let config = ProctopConfig {
            interval_secs: 0.5,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap().interval, MIN_INTERVAL);

        let config = ProctopConfig {
            interval_secs: 7.5,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap().interval, Duration::from_millis(7500));
    }

    #[test]
    fn rejects_invalid_values() {
        let bad_n = ProctopConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(matches!(bad_n.validate(), Err(ConfigError::InvalidTopN(0))));

        let negative_n = ProctopConfig {
            top_n: -2,
            ..Default::default()
        };
        assert!(matches!(negative_n.validate(), Err(ConfigError::InvalidTopN(-2))));

        for interval_secs in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e30, f64::MAX] {
            let config = ProctopConfig {
                interval_secs,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidInterval(_))),
                "interval {interval_secs} should be rejected"
            );
        }

        let bad_metric = ProctopConfig {
            metric: "network".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_metric.validate(), Err(ConfigError::UnknownMetric(_))));

        let bad_policy = ProctopConfig {
            underflow: "wrap".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            bad_policy.validate(),
            Err(ConfigError::UnknownUnderflowPolicy(_))
        ));

        let bad_hot = ProctopConfig {
            hot_cpu_percent: 150.0,
            ..Default::default()
        };
        assert!(matches!(bad_hot.validate(), Err(ConfigError::InvalidHotThreshold(_))));
    }

    #[test]
    fn loads_a_partial_file() {
        let path = write_temp("partial", "top_n = 5\nmetric = \"memory\"\nexclude_idle = false\n");
        let settings = load_from_file(&path).unwrap().validate().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(settings.top_n, 5);
        assert_eq!(settings.metric, Metric::Memory);
        assert!(!settings.idle.exclude);
        assert_eq!(settings.interval, MIN_INTERVAL);
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = std::env::temp_dir().join("proctop-does-not-exist.toml");
        let config = load_from_file(&path).unwrap();
        assert_eq!(config, ProctopConfig::default());
    }

    #[test]
    fn environment_overrides_the_file() {
        let path = write_temp("env", "top_n = 5\nmetric = \"memory\"\n");
        let vars = config::Map::from([
            ("PROCTOP_TOP_N".to_string(), "8".to_string()),
            ("PROCTOP_INTERVAL_SECS".to_string(), "4.5".to_string()),
        ]);
        let config = load(&path, environment().source(Some(vars))).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.top_n, 8);
        assert_eq!(config.interval_secs, 4.5);
        assert_eq!(config.metric, "memory", "unset variables leave the file alone");
    }

    #[test]
    fn invalid_reload_keeps_the_running_settings() {
        let path = write_temp("reload", "top_n = 4\n");
        let (sender, _receiver) = tokio::sync::mpsc::unbounded_channel();
        let mut manager = ConfigManager::new(path.clone(), sender).unwrap();
        assert_eq!(manager.current().top_n, 4);

        std::fs::write(&path, "top_n = 0\n").unwrap();
        assert!(matches!(manager.reload(), Err(ConfigError::InvalidTopN(0))));
        assert_eq!(manager.current().top_n, 4);

        std::fs::write(&path, "interval_secs = 1e30\n").unwrap();
        assert!(matches!(manager.reload(), Err(ConfigError::InvalidInterval(_))));
        assert_eq!(manager.current().interval, MIN_INTERVAL);

        std::fs::write(&path, "top_n = 6\n").unwrap();
        assert_eq!(manager.reload().unwrap().top_n, 6);
        assert_eq!(manager.current().top_n, 6);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn default_toml_round_trips() {
        let path = write_temp("init", &default_toml().unwrap());
        let config = load_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config, ProctopConfig::default());
    }
}
