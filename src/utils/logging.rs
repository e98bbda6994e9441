//! Logging initialization for the scanner

use anyhow::Result;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;

/// Map `-v`/`-q` flags to a level filter
pub fn level_from_flags(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Initialize logging for one-shot CLI commands (stderr)
pub fn init_cli_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_from_flags(verbose, quiet);

    Builder::from_default_env()
        .target(Target::Stderr)
        .filter_level(level)
        .format_timestamp_secs()
        .format_module_path(false)
        .try_init()?;

    log_panics::init();

    log::debug!("CLI logging initialized with level: {:?}", level);
    Ok(())
}

/// Initialize logging for the HTTP server
pub fn init_server_logging(
    structured: bool,
    log_file: Option<&str>,
    level: Option<LevelFilter>,
) -> Result<()> {
    let level = level.unwrap_or(LevelFilter::Info);

    if structured {
        init_json_logger(level, log_file)?;
    } else {
        init_human_readable_server_logger(level, log_file)?;
    }

    // Always initialize panic logging for server
    log_panics::init();

    log::info!("Server logging initialized with level: {:?}", level);
    Ok(())
}

fn open_target(log_file: Option<&str>) -> Result<Target> {
    use std::fs::OpenOptions;

    Ok(match log_file {
        Some(file_path) => Target::Pipe(Box::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?,
        )),
        None => Target::Stdout,
    })
}

/// JSON lines, one object per record
fn init_json_logger(level: LevelFilter, log_file: Option<&str>) -> Result<()> {
    use chrono::Utc;

    Builder::from_default_env()
        .target(open_target(log_file)?)
        .filter_level(level)
        .format(|buf, record| {
            let json = serde_json::json!({
                "timestamp": Utc::now().to_rfc3339(),
                "level": record.level().to_string(),
                "module": record.module_path().unwrap_or("unknown"),
                "message": record.args().to_string(),
                "target": record.target(),
            });
            writeln!(buf, "{}", json)
        })
        .try_init()?;

    Ok(())
}

fn init_human_readable_server_logger(level: LevelFilter, log_file: Option<&str>) -> Result<()> {
    Builder::from_default_env()
        .target(open_target(log_file)?)
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                buf.timestamp(),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        })
        .try_init()?;

    Ok(())
}
