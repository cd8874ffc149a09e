mod cli;
mod commands;
mod error_fmt;

use clap::Parser;
use eyre::WrapErr;
use mq131_config::Logging;
use mq131_core::CancelToken;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::commands::{MonitorOptions, SampleOverrides};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn init_tracing(json: bool, level: Option<&str>, logging: Option<&Logging>) -> eyre::Result<()> {
    // --log-level beats [logging] level
    let level = level
        .or_else(|| logging.and_then(|l| l.level.as_deref()))
        .unwrap_or("warn");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // console logs go to stderr so stdout carries only results
    let pretty = (!json).then(|| fmt::layer().with_writer(std::io::stderr).with_target(false));
    let json_console = json.then(|| fmt::layer().json().with_writer(std::io::stderr));

    let file = match logging.and_then(|l| l.file.as_deref()) {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;
            let appender = match logging.and_then(|l| l.rotation.as_deref()) {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json_console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = mq131_config::load_path(&cli.config)?;
    init_tracing(cli.json, cli.log_level.as_deref(), Some(&cfg.logging))?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    let cancel = CancelToken::new();
    {
        let token = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || token.cancel()) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let sensor = commands::open_sensor(&cfg)?;
    match cli.cmd {
        Commands::Sample {
            gas,
            unit,
            temperature,
            humidity,
            r0,
            preheat_secs,
        } => {
            let overrides = SampleOverrides {
                gas,
                unit,
                temperature,
                humidity,
                r0,
                preheat_secs,
            };
            commands::run_sample(&cfg, sensor, overrides, &cancel, cli.json).map(|_| ())
        }
        Commands::Calibrate {
            stable_cycles,
            max_secs,
        } => commands::run_calibrate(&cfg, sensor, stable_cycles, max_secs, &cancel, cli.json)
            .map(|_| ()),
        Commands::Monitor {
            gas,
            unit,
            interval_secs,
            count,
        } => {
            let opts = MonitorOptions {
                gas,
                unit,
                interval_secs,
                count,
            };
            commands::run_monitor(&cfg, sensor, opts, &cancel, cli.json).map(|_| ())
        }
        Commands::SelfCheck => commands::run_self_check(&cfg, sensor, cli.json),
    }
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(err) = run(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::debug!(error = ?err, "command failed");
        std::process::exit(exit_code_for_error(&err));
    }
}
