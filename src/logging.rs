//! Logger bootstrap for the binary. Library code only talks to the `log`
//! facade; this wires it to stderr.

use flexi_logger::{FlexiLoggerError, Logger, LoggerHandle};

/// Level used when `RUST_LOG` is unset.
pub const DEFAULT_LEVEL: &str = "info";

/// Start logging to stderr, honouring `RUST_LOG` when present. Keep the
/// returned handle alive for as long as logs should be written.
pub fn init_logging() -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str(DEFAULT_LEVEL)?
        .log_to_stderr()
        .format(flexi_logger::detailed_format)
        .start()
}
