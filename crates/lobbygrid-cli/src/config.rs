// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::LevelFilter;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const CONFIG_VERSION: i64 = 1;
pub const CONFIG_PATH_ENV: &str = "LOBBYGRID_CONFIG_PATH";
const DEFAULT_WIDTH: u32 = 120;
const DEFAULT_HEIGHT: u32 = 40;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_FEED_SEED: u64 = 20_260_101;
const DEFAULT_FEED_USERS: usize = 40;
const DEFAULT_FEED_BATTLES: usize = 12;
const DEFAULT_FEED_INTERVAL: &str = "750ms";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub feed: Feed,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            log: Log::default(),
            feed: Feed::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub prefs_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub save_prefs: Option<bool>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            save_prefs: Some(true),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feed {
    pub seed: Option<u64>,
    pub users: Option<usize>,
    pub battles: Option<usize>,
    pub interval: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let app_dir = lobbygrid_store::config_dir().with_context(|| {
            format!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` at the top and keep values under [storage], [ui], [log], and [feed]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(prefs_path) = &self.storage.prefs_path {
            lobbygrid_store::validate_prefs_path(prefs_path)
                .with_context(|| format!("storage.prefs_path in {}", path.display()))?;
        }

        for (key, value) in [("ui.width", self.ui.width), ("ui.height", self.ui.height)] {
            if value == Some(0) {
                bail!("{key} in {} must be positive, got 0", path.display());
            }
        }

        if let Some(level) = &self.log.level {
            parse_level(level)
                .with_context(|| format!("log.level in {}", path.display()))?;
        }

        if let Some(interval) = &self.feed.interval {
            let parsed = parse_duration(interval)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "feed.interval in {} must be positive, got {}",
                    path.display(),
                    interval
                );
            }
        }

        Ok(())
    }

    /// Config value first, then `LOBBYGRID_PREFS_PATH`, then the platform
    /// default.
    pub fn prefs_path(&self) -> Result<PathBuf> {
        match &self.storage.prefs_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => lobbygrid_store::default_prefs_path(),
        }
    }

    pub fn width(&self) -> u32 {
        self.ui.width.unwrap_or(DEFAULT_WIDTH)
    }

    pub fn height(&self) -> u32 {
        self.ui.height.unwrap_or(DEFAULT_HEIGHT)
    }

    pub fn save_prefs(&self) -> bool {
        self.ui.save_prefs.unwrap_or(true)
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        parse_level(self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL))
    }

    pub fn feed_seed(&self) -> u64 {
        self.feed.seed.unwrap_or(DEFAULT_FEED_SEED)
    }

    pub fn feed_users(&self) -> usize {
        self.feed.users.unwrap_or(DEFAULT_FEED_USERS)
    }

    pub fn feed_battles(&self) -> usize {
        self.feed.battles.unwrap_or(DEFAULT_FEED_BATTLES)
    }

    pub fn feed_interval(&self) -> Result<Duration> {
        parse_duration(
            self.feed
                .interval
                .as_deref()
                .unwrap_or(DEFAULT_FEED_INTERVAL),
        )
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# lobbygrid config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is the platform config dir (for example ~/.config/lobbygrid/prefs.db)\n# prefs_path = \"/absolute/path/to/prefs.db\"\n\n[ui]\n# Initial table size before the terminal reports its own\nwidth = {DEFAULT_WIDTH}\nheight = {DEFAULT_HEIGHT}\nsave_prefs = true\n\n[log]\n# error, warn, info, debug, trace or off\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n\n[feed]\nseed = {DEFAULT_FEED_SEED}\nusers = {DEFAULT_FEED_USERS}\nbattles = {DEFAULT_FEED_BATTLES}\ninterval = \"{DEFAULT_FEED_INTERVAL}\"\n",
            path.display(),
        )
    }
}

fn parse_level(raw: &str) -> Result<LevelFilter> {
    LevelFilter::from_str(raw.trim()).map_err(|_| {
        anyhow!("invalid log level {raw:?}; use one of: off, error, warn, info, debug, trace")
    })
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid interval {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid interval {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid interval {raw:?}; use <N>ms or <N>s (for example 750ms or 2s)")
}

#[cfg(test)]
mod tests {
    use super::{CONFIG_PATH_ENV, Config, parse_duration};
    use anyhow::Result;
    use log::LevelFilter;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert!(config.save_prefs());
        assert_eq!(config.width(), 120);
        assert_eq!(config.log_level()?, LevelFilter::Info);
        assert_eq!(config.feed_interval()?, Duration::from_millis(750));
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[ui]\nwidth = 80\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[storage], [ui], [log], and [feed]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[ui]\nwidth = 90\nheight = 30\nsave_prefs = false\n[log]\nlevel = \"debug\"\n[feed]\nseed = 7\nusers = 3\nbattles = 2\ninterval = \"2s\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.width(), 90);
        assert_eq!(config.height(), 30);
        assert!(!config.save_prefs());
        assert_eq!(config.log_level()?, LevelFilter::Debug);
        assert_eq!(config.feed_seed(), 7);
        assert_eq!(config.feed_users(), 3);
        assert_eq!(config.feed_battles(), 2);
        assert_eq!(config.feed_interval()?, Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 3\n")?;
        let error = Config::load(&path).expect_err("v3 config should fail");
        assert!(error.to_string().contains("unsupported config version 3"));
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[ui]\nwidth = 0\n")?;
        let error = Config::load(&path).expect_err("zero width should fail");
        assert!(error.to_string().contains("ui.width"));

        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"loud\"\n")?;
        let error = Config::load(&path).expect_err("unknown level should fail");
        assert!(format!("{error:#}").contains("invalid log level"));

        let (_temp, path) = write_config("version = 1\n[feed]\ninterval = \"0ms\"\n")?;
        let error = Config::load(&path).expect_err("zero interval should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn interval_parses_milliseconds_and_seconds() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert!(parse_duration("2m").is_err());
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_PATH_ENV, &override_path);
        }
        let resolved = Config::default_path();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_PATH_ENV);
        }
        assert_eq!(resolved?, override_path);
        Ok(())
    }

    #[test]
    fn prefs_path_prefers_storage_config_over_env_override() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 1\n[storage]\nprefs_path = \"/explicit/prefs.db\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(lobbygrid_store::PREFS_PATH_ENV, "/from/env.db");
        }
        let config = Config::load(&path);
        let resolved = config.as_ref().map(Config::prefs_path);
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(lobbygrid_store::PREFS_PATH_ENV);
        }
        assert_eq!(resolved.ok().and_then(Result::ok), Some(PathBuf::from("/explicit/prefs.db")));
        Ok(())
    }

    #[test]
    fn prefs_path_rejects_uri_style_storage_value() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[storage]\nprefs_path = \"https://example.com/prefs.db\"\n")?;
        let error = Config::load(&path).expect_err("URI prefs_path should fail validation");
        let message = format!("{error:#}");
        assert!(message.contains("looks like a URI"), "unexpected message: {message}");
        Ok(())
    }

    #[test]
    fn example_config_loads_cleanly() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, Config::example_config(&path))?;
        let config = Config::load(&path)?;
        assert!(config.save_prefs());
        assert_eq!(config.feed_users(), 40);
        Ok(())
    }
}
