//! Logging setup
//!
//! The proxy logs through the `log` facade; `env_logger` writes the lines to
//! standard error.

/// Initialize the logger
///
/// `RUST_LOG` takes precedence over `level` when it is set. Calling this more
/// than once is harmless: only the first call installs a logger.
///
/// # Parameters
///
/// * `level` - Default filter, e.g. `info` or `debug`
pub fn init_logger(level: &str) {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", level);

    let _ = env_logger::Builder::from_env(env).try_init();
}
