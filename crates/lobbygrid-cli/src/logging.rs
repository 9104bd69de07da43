// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOG_FILE_NAME: &str = "lobbygrid.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// The TUI owns the terminal, so records go to a file.
    File(PathBuf),
}

pub fn log_file_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(LOG_FILE_NAME)
}

/// Installs the global logger. `RUST_LOG` directives refine `level`.
pub fn init_logging(level: LevelFilter, target: &LogTarget) -> Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(level).parse_default_env();

    match target {
        LogTarget::Stderr => {
            builder
                .target(Target::Stderr)
                .format_timestamp_secs()
                .format_module_path(false);
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder
                .target(Target::Pipe(Box::new(file)))
                .format(|buf, record| {
                    writeln!(
                        buf,
                        "{} [{}] {}: {}",
                        buf.timestamp(),
                        record.level(),
                        record.module_path().unwrap_or("unknown"),
                        record.args()
                    )
                });
        }
    }

    builder
        .try_init()
        .context("install logger; it may already be initialized")?;
    log::debug!("logging initialized at {level} to {target:?}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{LOG_FILE_NAME, log_file_path};
    use std::path::Path;

    #[test]
    fn log_file_lives_in_cache_dir() {
        assert_eq!(
            log_file_path(Path::new("/var/cache/lobbygrid")),
            Path::new("/var/cache/lobbygrid").join(LOG_FILE_NAME)
        );
    }
}
