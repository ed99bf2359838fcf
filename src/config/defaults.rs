//! Default configuration values
//!
//! Single source of truth for the defaults used by the configuration file
//! parser and the command line.

/// Configuration file read when no path is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "godist.conf";

/// Log level when verbose mode is off
pub const LOG_LEVEL_STR: &str = "info";

/// Log level when verbose mode is on
pub const VERBOSE_LOG_LEVEL_STR: &str = "debug";

/// Default relay buffer size in bytes
pub const BUFFER_SIZE: usize = 2048;

/// Default relay buffer size
pub fn buffer_size() -> usize {
    BUFFER_SIZE
}

/// Default connect timeout: none, the dial waits as long as the OS does
pub fn connect_timeout() -> Option<u64> {
    None
}
