//! godist command line tool
//!
//! Loads the configuration file and runs the proxy until a fatal listener
//! error or Ctrl+C.

use clap::{CommandFactory, Parser};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use godist::config::{log_level, ProxyConfig, DEFAULT_CONFIG_FILE};
use godist::common::init_logger;
use godist::{Proxy, Result, APP_NAME, VERSION};

/// Exit status for configuration and listener errors
const EXIT_FAILURE: u8 = 1;

/// Exit status for `-h` and command line errors
const EXIT_USAGE: u8 = 2;

/// godist: hash-dispatching TCP load-balancing proxy
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version = VERSION, about, long_about = None, disable_help_flag = true)]
struct Args {
    /// Verbose output
    #[arg(short = 'v')]
    verbose: bool,

    /// Help message
    #[arg(short = 'h')]
    help: bool,

    /// Configuration file
    #[arg(default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit with status 2
    let args = Args::parse();

    if args.help {
        eprintln!("{}", Args::command().render_help());
        return ExitCode::from(EXIT_USAGE);
    }

    // Before loading, so configuration warnings are not lost
    init_logger(log_level(args.verbose));
    info!("{} v{}", APP_NAME, VERSION);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(code) => return ExitCode::from(code),
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Load the configuration named on the command line
///
/// Errors are printed as one line on standard error; the exit status is returned.
fn load_config(args: &Args) -> std::result::Result<ProxyConfig, u8> {
    match ProxyConfig::load(&args.config) {
        Ok(config) => Ok(config.with_verbose(args.verbose)),
        Err(e) => {
            eprintln!("{}", e);
            Err(EXIT_FAILURE)
        }
    }
}

async fn run(config: ProxyConfig) -> Result<()> {
    let proxy = Proxy::bind(Arc::new(config)).await?;

    proxy
        .run_until(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C");
            } else {
                // Without a signal handler, run until a listener error
                std::future::pending::<()>().await;
            }
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::fs;

    #[test]
    fn test_config_path_defaults() {
        let args = Args::try_parse_from(["godist"]).unwrap();

        assert_eq!(args.config, PathBuf::from("godist.conf"));
        assert!(!args.verbose);
        assert!(!args.help);
    }

    #[test]
    fn test_flags_and_path() {
        let args = Args::try_parse_from(["godist", "-h", "-v", "x.conf"]).unwrap();

        assert!(args.help);
        assert!(args.verbose);
        assert_eq!(args.config, PathBuf::from("x.conf"));
    }

    #[test]
    fn test_extra_positional_is_usage_error() {
        let err = Args::try_parse_from(["godist", "a.conf", "b.conf"]).unwrap_err();
        assert_eq!(err.exit_code(), i32::from(EXIT_USAGE));

        let err = Args::try_parse_from(["godist", "--bogus"]).unwrap_err();
        assert_eq!(err.exit_code(), i32::from(EXIT_USAGE));
    }

    #[test]
    fn test_config_errors_exit_with_failure() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("godist.conf");
        let args = Args::try_parse_from([OsStr::new("godist"), missing.as_os_str()]).unwrap();
        assert_eq!(load_config(&args).unwrap_err(), EXIT_FAILURE);

        let empty = dir.path().join("empty.conf");
        fs::write(&empty, r#"{"listen": "127.0.0.1:9000", "backends": []}"#).unwrap();
        let args = Args::try_parse_from([OsStr::new("godist"), empty.as_os_str()]).unwrap();
        assert_eq!(load_config(&args).unwrap_err(), EXIT_FAILURE);
    }

    #[test]
    fn test_verbose_flag_reaches_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("godist.conf");
        fs::write(&path, r#"{"listen": "127.0.0.1:9000", "backends": ["127.0.0.1:9001"]}"#).unwrap();

        let args = Args::try_parse_from([OsStr::new("godist"), OsStr::new("-v"), path.as_os_str()]).unwrap();
        let config = load_config(&args).unwrap();

        assert!(config.verbose());
        assert_eq!(config.log_level(), "debug");
    }
}
