//! Process logging for the CLI.
//!
//! Logs go to stderr so stdout stays clean for `ddl` and `list-tables`
//! output. Library code only uses the `log` macros; nothing is emitted until
//! `init_logging` installs the backend.

use flexi_logger::{Logger, LoggerHandle};
use log::info;

/// Level used when neither `--log-level` nor `ARKDATA_LOG` is given
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Starts the stderr logger. Keep the handle alive for the process lifetime.
pub fn init_logging(level: &str) -> Result<LoggerHandle, String> {
    let level = normalize_level(level)?;

    let handle = Logger::try_with_str(level)
        .map_err(|err| format!("invalid log level `{level}`: {err}"))?
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .map_err(|err| format!("failed to start logger: {err}"))?;

    info!(
        "event=app_start module=cli status=ok platform={} version={} level={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        level
    );
    Ok(handle)
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        "off" => Ok("off"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error|off"
        )),
    }
}
