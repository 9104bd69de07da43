// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod feed;
mod logging;

use anyhow::{Context, Result, anyhow};
use config::Config;
use feed::{LobbySimulator, SimulatedFeed};
use lobbygrid_app::{LobbyList, LobbyState, MemoryPrefs, SharedPrefs};
use lobbygrid_store::Store;
use lobbygrid_tui::{LobbyTables, TableLayout};
use logging::{LogTarget, init_logging, log_file_path};
use std::env;
use std::path::{Path, PathBuf};
use std::rc::Rc;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let dirs = lobbygrid_store::init_dirs()?;
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `lobbygrid --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let prefs_path = match &options.prefs_path {
        Some(path) => path.clone(),
        None => config.prefs_path()?,
    };
    if options.print_prefs_path {
        println!("{}", prefs_path.display());
        return Ok(());
    }

    let target = if options.starts_tui() {
        LogTarget::File(log_file_path(&dirs.cache))
    } else {
        LogTarget::Stderr
    };
    init_logging(config.log_level()?, &target)?;

    if let Some(namespace) = &options.reset_prefs {
        let store = open_store(&prefs_path)?;
        let removed = store.reset_namespace(namespace)?;
        log::info!("reset {namespace} in {}", prefs_path.display());
        println!("removed {removed} stored preference(s) for {namespace}");
        return Ok(());
    }

    let prefs: SharedPrefs = if options.demo {
        log::info!("demo mode: preferences stay in memory");
        MemoryPrefs::shared()
    } else {
        Rc::new(open_store(&prefs_path)?)
    };
    let interval = config.feed_interval()?;
    if options.check_only {
        log::info!("config {} is valid", options.config_path.display());
        return Ok(());
    }

    let mut tables = LobbyTables::new(
        prefs,
        TableLayout {
            width: config.width(),
            height: config.height(),
            save_prefs: config.save_prefs(),
        },
    );
    let mut feed = SimulatedFeed::new(
        LobbySimulator::new(config.feed_seed(), config.feed_users(), config.feed_battles()),
        interval,
    );
    let mut state = LobbyState::default();
    lobbygrid_tui::run_app(&mut state, &mut tables, &mut feed)
}

fn open_store(path: &Path) -> Result<Store> {
    let store = Store::open(path).with_context(|| {
        format!(
            "open preferences {} -- if this path is wrong, set [storage].prefs_path or {}",
            path.display(),
            lobbygrid_store::PREFS_PATH_ENV
        )
    })?;
    store.bootstrap()?;
    Ok(store)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    prefs_path: Option<PathBuf>,
    print_config_path: bool,
    print_prefs_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    reset_prefs: Option<String>,
    show_help: bool,
}

impl CliOptions {
    fn starts_tui(&self) -> bool {
        !self.check_only && self.reset_prefs.is_none()
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        prefs_path: None,
        print_config_path: false,
        print_prefs_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        reset_prefs: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--prefs" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--prefs requires a file path"))?;
                lobbygrid_store::validate_prefs_path(value.as_ref())?;
                options.prefs_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-prefs-path" => {
                options.print_prefs_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--reset-prefs" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow!("--reset-prefs requires a table name ({})", table_names())
                })?;
                let namespace = value.as_ref();
                if !LobbyList::ALL
                    .iter()
                    .any(|list| list.table_name() == namespace)
                {
                    return Err(anyhow!(
                        "unknown table {namespace:?}; use one of {}",
                        table_names()
                    ));
                }
                options.reset_prefs = Some(namespace.to_owned());
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn table_names() -> String {
    LobbyList::ALL
        .iter()
        .map(|list| list.table_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_help() {
    println!("lobbygrid");
    println!("  --config <path>          Use a specific config path");
    println!("  --prefs <path>           Use a specific preferences database");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-prefs-path       Print resolved preferences path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Keep column layout in memory only");
    println!("  --check                  Validate config + preferences store");
    println!("  --reset-prefs <table>    Forget stored layout for UserList or BattleList");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/lobbygrid-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                prefs_path: None,
                print_config_path: false,
                print_prefs_path: false,
                demo: false,
                print_example: false,
                check_only: false,
                reset_prefs: None,
                show_help: false,
            }
        );
        assert!(options.starts_tui());
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_path_overrides() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml", "--prefs", "/custom/prefs.db"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.prefs_path, Some(PathBuf::from("/custom/prefs.db")));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--reset-prefs"], default_options_path())
            .expect_err("missing table should fail");
        assert!(error.to_string().contains("UserList, BattleList"));
    }

    #[test]
    fn parse_cli_args_rejects_uri_prefs_path() {
        let error = parse_cli_args(vec!["--prefs", "file:prefs.db"], default_options_path())
            .expect_err("URI prefs path should fail");
        assert!(error.to_string().contains("file: URI"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(!options.print_prefs_path);
        assert!(!options.demo);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        assert!(!options.starts_tui());
        Ok(())
    }

    #[test]
    fn parse_cli_args_accepts_known_tables_for_reset() -> Result<()> {
        let options = parse_cli_args(vec!["--reset-prefs", "BattleList"], default_options_path())?;
        assert_eq!(options.reset_prefs.as_deref(), Some("BattleList"));
        assert!(!options.starts_tui());

        let error = parse_cli_args(vec!["--reset-prefs", "Chat"], default_options_path())
            .expect_err("unknown table should fail");
        assert!(error.to_string().contains("unknown table"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_demo_and_prefs_path_print_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--demo", "--print-prefs-path"],
            default_options_path(),
        )?;
        assert!(!options.print_config_path);
        assert!(options.print_prefs_path);
        assert!(options.demo);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
