//! Logging setup for the server.
//!
//! A bare level such as `debug` applies to this crate only; HTTP, SQLite and
//! client internals stay at `warn` unless a full directive string asks for
//! more. Output goes to stderr, or is appended to a log file when one is set
//! on the command line or in `[server] log_file`.

use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::Config;
use crate::error::AppError;

const CRATE_TARGET: &str = "portfolio_server";

/// Targets that are noisy at `debug` and rarely useful here.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "tower", "tower_http", "axum"];

/// Where the level and log file come from, after CLI flags are parsed.
#[derive(Debug, Clone, Copy)]
pub struct LogSettings<'a> {
    pub level: &'a str,
    /// `true` when `level` came from `--log-level`; it then beats `RUST_LOG`.
    pub from_cli: bool,
    pub file: Option<&'a Path>,
}

impl<'a> LogSettings<'a> {
    /// CLI values win over the configured ones.
    pub fn resolve(config: &'a Config, cli_level: Option<&'a str>, cli_file: Option<&'a Path>) -> Self {
        Self {
            level: cli_level.unwrap_or(&config.log_level),
            from_cli: cli_level.is_some(),
            file: cli_file.or(config.log_file.as_deref()),
        }
    }
}

/// Expand a bare level into crate-scoped directives. Anything that already
/// looks like a directive list (`target=level`, commas) is used as written.
pub fn directives(level: &str) -> String {
    let level = level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let mut out = format!("warn,{CRATE_TARGET}={level}");
    for target in QUIET_TARGETS {
        out.push_str(&format!(",{target}=warn"));
    }
    out
}

fn build_filter(settings: &LogSettings<'_>) -> Result<EnvFilter, AppError> {
    let from_level = || {
        EnvFilter::try_new(directives(settings.level))
            .map_err(|e| AppError::Logger(format!("invalid log level '{}': {e}", settings.level)))
    };
    if settings.from_cli {
        return from_level();
    }
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => from_level(),
    }
}

fn build_writer(file: Option<&Path>) -> Result<BoxMakeWriter, AppError> {
    let Some(path) = file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Logger(format!("cannot create log directory '{}': {e}", parent.display()))
        })?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::Logger(format!("failed to open log file '{}': {e}", path.display())))?;
    Ok(BoxMakeWriter::new(file))
}

/// Install the global subscriber. Call once, after config is loaded.
pub fn init(settings: LogSettings<'_>) -> Result<(), AppError> {
    let filter = build_filter(&settings)?;
    let to_file = settings.file.is_some();
    let writer = build_writer(settings.file)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(!to_file)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

/// Validate a `--log-level` value before anything else starts.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn bare_level_is_scoped_to_the_crate() {
        let d = directives("debug");
        assert!(d.starts_with("warn,portfolio_server=debug"));
        assert!(d.contains("tower_http=warn"));
        assert!(EnvFilter::try_new(&d).is_ok());
    }

    #[test]
    fn directive_lists_pass_through() {
        assert_eq!(directives("portfolio_server=trace,hyper=info"), "portfolio_server=trace,hyper=info");
    }

    #[test]
    fn cli_beats_config() {
        let mut cfg = Config::test_default(Path::new("/tmp"));
        cfg.log_level = "warn".into();
        cfg.log_file = Some(PathBuf::from("/tmp/from-config.log"));

        let s = LogSettings::resolve(&cfg, None, None);
        assert_eq!(s.level, "warn");
        assert!(!s.from_cli);
        assert_eq!(s.file, Some(Path::new("/tmp/from-config.log")));

        let cli_file = PathBuf::from("/tmp/from-cli.log");
        let s = LogSettings::resolve(&cfg, Some("trace"), Some(&cli_file));
        assert_eq!(s.level, "trace");
        assert!(s.from_cli);
        assert_eq!(s.file, Some(cli_file.as_path()));
    }

    #[test]
    fn writer_creates_missing_log_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("logs/server.log");
        assert!(build_writer(Some(&path)).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn level_validation() {
        for l in ["error", "warn", "info", "debug", "trace"] {
            assert!(parse_level(l).is_ok(), "expected '{l}' to be valid");
        }
        assert!(parse_level("verbose").is_err());
        assert!(parse_level("").is_err());
    }
}
