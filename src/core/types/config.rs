use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Deserializer};

use crate::types::{ConfigError, parse_duration};

pub const CONFIG_FILENAME: &str = "sqlstress.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LogConfig {
    pub level: Option<String>,
    pub color: Option<bool>, // None = auto-detect (semantic)
}

impl LogConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn color(&self) -> Option<bool> {
        self.color // None has semantic meaning (auto-detect)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DbConfig {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub url: Option<String>, // takes precedence over the discrete fields
}

impl DbConfig {
    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost:3306")
    }

    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or("root")
    }

    pub fn password(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }

    pub fn database(&self) -> &str {
        self.database.as_deref().unwrap_or("your_database_name")
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunConfig {
    pub query: Option<String>,
    #[serde(default, deserialize_with = "deserialize_interval")]
    pub interval: Option<Duration>,
    pub concurrency: Option<u32>,
    pub iteration: Option<u32>,
}

impl RunConfig {
    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }

    pub fn interval(&self) -> Duration {
        self.interval.unwrap_or(Duration::from_secs(10 * 60))
    }

    pub fn concurrency(&self) -> u32 {
        self.concurrency.unwrap_or(10)
    }

    pub fn iteration(&self) -> u32 {
        self.iteration.unwrap_or(5)
    }
}

fn deserialize_interval<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_duration(&s).map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    pub db: Option<DbConfig>,
    pub run: Option<RunConfig>,
    pub log: Option<LogConfig>,
}

impl Config {
    pub fn db(&self) -> DbConfig {
        self.db.clone().unwrap_or_default()
    }

    pub fn run(&self) -> RunConfig {
        self.run.clone().unwrap_or_default()
    }

    pub fn log(&self) -> LogConfig {
        self.log.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<String>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub url: Option<String>,
    pub query: Option<String>,
    pub interval: Option<Duration>,
    pub concurrency: Option<u32>,
    pub iteration: Option<u32>,
    pub log_level: Option<String>,
    pub log_color: Option<String>, // "on" | "off"
}

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

/// Resolve the global configuration: config file first, then CLI overrides.
pub fn init_with_overrides(overrides: &CliOverrides) -> Result<(), ConfigError> {
    let cwd = std::env::current_dir().map_err(|source| ConfigError::Read {
        path: ".".to_string(),
        source,
    })?;
    let cfg = load_config(&cwd, overrides)?;
    let _ = CONFIG.set(cfg);
    Ok(())
}

/// Build a [`Config`] relative to `cwd` without touching the global.
///
/// An explicit `--config` path must exist and parse. Otherwise the nearest
/// `sqlstress.toml` found walking up from `cwd` is used, if any.
pub fn load_config(cwd: &Path, overrides: &CliOverrides) -> Result<Config, ConfigError> {
    let mut cfg = Config::default();

    let file_path = match &overrides.config {
        Some(path) => Some(cwd.join(path)),
        None => find_nearest_config_file(cwd),
    };
    if let Some(path) = file_path {
        let file_cfg = read_config_file(&path)?;
        apply_file_config(&mut cfg, &file_cfg);
    }

    apply_cli_overrides(&mut cfg, overrides);
    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let display = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: display.clone(),
        source,
    })?;
    toml::from_str::<Config>(&contents).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

fn apply_file_config(cfg: &mut Config, file: &Config) {
    if let Some(file_db) = &file.db {
        let mut db = cfg.db();
        merge(&mut db.host, &file_db.host);
        merge(&mut db.user, &file_db.user);
        merge(&mut db.password, &file_db.password);
        merge(&mut db.database, &file_db.database);
        merge(&mut db.url, &file_db.url);
        cfg.db = Some(db);
    }

    if let Some(file_run) = &file.run {
        let mut run = cfg.run();
        merge(&mut run.query, &file_run.query);
        merge(&mut run.interval, &file_run.interval);
        merge(&mut run.concurrency, &file_run.concurrency);
        merge(&mut run.iteration, &file_run.iteration);
        cfg.run = Some(run);
    }

    if let Some(file_log) = &file.log {
        let mut log = cfg.log();
        merge(&mut log.level, &file_log.level);
        merge(&mut log.color, &file_log.color);
        cfg.log = Some(log);
    }
}

fn apply_cli_overrides(cfg: &mut Config, overrides: &CliOverrides) {
    let mut db = cfg.db();
    merge(&mut db.host, &overrides.host);
    merge(&mut db.user, &overrides.user);
    merge(&mut db.password, &overrides.password);
    merge(&mut db.database, &overrides.database);
    merge(&mut db.url, &overrides.url);
    cfg.db = Some(db);

    let mut run = cfg.run();
    merge(&mut run.query, &overrides.query);
    merge(&mut run.interval, &overrides.interval);
    merge(&mut run.concurrency, &overrides.concurrency);
    merge(&mut run.iteration, &overrides.iteration);
    cfg.run = Some(run);

    let mut log = cfg.log();
    if let Some(level) = &overrides.log_level
        && !level.trim().is_empty()
    {
        log.level = Some(level.trim().to_string());
    }
    if let Some(color_str) = &overrides.log_color {
        match color_str.to_lowercase().as_str() {
            "on" => log.color = Some(true),
            "off" => log.color = Some(false),
            _ => {}
        }
    }
    cfg.log = Some(log);
}

// Only override if the higher-priority source specified a value
fn merge<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if source.is_some() {
        *target = source.clone();
    }
}

fn find_nearest_config_file(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.exists())
}

pub fn colors_enabled() -> bool {
    match config().log().color() {
        Some(force) => force,
        None => console::colors_enabled(),
    }
}
