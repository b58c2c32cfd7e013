//! The built-in logger.
//!
//! The crate logs through the `log` facade. When the `builtin_env_logger` feature is enabled,
//! installing a barrier set also installs `env_logger`, filtered by `RUST_LOG` with `info` as the
//! default level. A VM that installs its own logger first keeps it.

use log::SetLoggerError;

/// Attempt to init a env_logger for the barrier set.
/// Does nothing if the "builtin_env_logger" feature is disabled.
pub fn try_init() -> Result<(), SetLoggerError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "builtin_env_logger")] {
            env_logger::try_init_from_env(
                // By default, use info level logging.
                env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
            )
        } else {
            Ok(())
        }
    }
}

/// Init the logger unless a logger is already set, and report which happened.
pub(crate) fn init() {
    match try_init() {
        Ok(_) => debug!("The barrier set initialized the logger."),
        Err(_) => debug!("A logger has already been set. The barrier set will use it."),
    }
}
