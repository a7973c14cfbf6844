//! Logging hooks for the codec.
//!
//! The library only talks to the `log` facade. The `log_metric!` macro is the
//! primary tool for per-batch events: it renders a flat key/value record at
//! debug level and costs a single level check when debug logging is off.
//! Hosts that have no logger of their own can call [`init_logging`].

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Once;

use log::LevelFilter;

use crate::error::CodecError;

/// Logs a structured key-value metric line at debug level.
///
/// # Example
/// ```
/// use geoseries::log_metric;
/// let rows = 4;
/// log_metric!("event"="flush_batch", "rows"=&rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if log::log_enabled!(log::Level::Debug) {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("GEOSERIES_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend once per process.
///
/// Records go to stderr, or are appended to `log_file` when given. Later calls
/// are no-ops, as is the first one if another logger is already installed.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<(), CodecError> {
    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        // Level and message only
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(LevelFilter::Debug, None).unwrap();
        init_logging(LevelFilter::Trace, None).unwrap();
        let rows = 3;
        log_metric!("event" = "test", "rows" = &rows);
    }

    #[test]
    fn test_init_logging_reports_unopenable_file() {
        let dir = std::env::temp_dir();
        let result = init_logging(LevelFilter::Info, Some(dir.as_path()));
        assert!(matches!(result, Err(CodecError::Io(_))));
    }
}
