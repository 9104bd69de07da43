// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "lobbygrid";
pub const PREFS_FILE_NAME: &str = "prefs.db";
pub const CONFIG_DIR_ENV: &str = "LOBBYGRID_CONFIG_DIR";
pub const CACHE_DIR_ENV: &str = "LOBBYGRID_CACHE_DIR";
pub const PREFS_PATH_ENV: &str = "LOBBYGRID_PREFS_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    pub config: PathBuf,
    pub cache: PathBuf,
}

/// Resolves and creates both application directories.
pub fn init_dirs() -> Result<AppDirs> {
    Ok(AppDirs {
        config: config_dir()?,
        cache: cache_dir()?,
    })
}

pub fn config_dir() -> Result<PathBuf> {
    resolve_dir(CONFIG_DIR_ENV, dirs::config_dir, "config")
}

pub fn cache_dir() -> Result<PathBuf> {
    resolve_dir(CACHE_DIR_ENV, dirs::cache_dir, "cache")
}

pub fn default_prefs_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(PREFS_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join(PREFS_FILE_NAME))
}

fn resolve_dir(
    env_key: &str,
    platform_root: fn() -> Option<PathBuf>,
    label: &str,
) -> Result<PathBuf> {
    let dir = match env::var_os(env_key) {
        Some(path) => PathBuf::from(path),
        None => platform_root()
            .ok_or_else(|| anyhow!("cannot resolve {label} directory; set {env_key}"))?
            .join(APP_NAME),
    };
    ensure_dir(&dir, label)?;
    Ok(dir)
}

fn ensure_dir(dir: &Path, label: &str) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create {label} directory {}", dir.display()))?;
    if !dir.is_dir() {
        bail!("{label} path {} exists but is not a directory", dir.display());
    }
    Ok(())
}

pub fn validate_prefs_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("preferences path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "preferences path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("preferences path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "preferences path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        CACHE_DIR_ENV, CONFIG_DIR_ENV, PREFS_PATH_ENV, default_prefs_path, init_dirs,
        validate_prefs_path,
    };
    use anyhow::Result;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn validate_prefs_path_rejects_uri_forms() {
        assert!(validate_prefs_path("").is_err());
        assert!(validate_prefs_path("file:prefs.db").is_err());
        assert!(validate_prefs_path("https://example.com/prefs.db").is_err());
        assert!(validate_prefs_path("prefs.db?mode=ro").is_err());
        assert!(validate_prefs_path(":memory:").is_ok());
        assert!(validate_prefs_path("/tmp/lobbygrid/prefs.db").is_ok());
    }

    #[test]
    fn init_dirs_honors_env_overrides_and_creates_them() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let config = temp.path().join("cfg");
        let cache = temp.path().join("nested").join("cache");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(CONFIG_DIR_ENV, &config);
            std::env::set_var(CACHE_DIR_ENV, &cache);
            std::env::remove_var(PREFS_PATH_ENV);
        }
        let dirs = init_dirs();
        let prefs = default_prefs_path();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(CONFIG_DIR_ENV);
            std::env::remove_var(CACHE_DIR_ENV);
        }

        let dirs = dirs?;
        assert_eq!(dirs.config, config);
        assert_eq!(dirs.cache, cache);
        assert!(config.is_dir());
        assert!(cache.is_dir());
        assert_eq!(prefs?, config.join("prefs.db"));
        Ok(())
    }

    #[test]
    fn prefs_path_env_wins() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var(PREFS_PATH_ENV, "/from/env/prefs.db");
        }
        let resolved = default_prefs_path();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var(PREFS_PATH_ENV);
        }
        assert_eq!(resolved?, std::path::PathBuf::from("/from/env/prefs.db"));
        Ok(())
    }
}
