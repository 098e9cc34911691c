//! CLI argument definitions for logwarden-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Default configuration file path, used when `--config` is not given.
///
/// A missing file at this path is not an error; built-in defaults apply.
pub const DEFAULT_CONFIG_PATH: &str = "logwarden.toml";

/// Logwarden security log monitoring daemon.
///
/// Tails the configured application log, detects attack patterns
/// (brute force, SQL injection, protected-endpoint probing), records
/// alerts, and emits daily summary reports.
#[derive(Parser, Debug)]
#[command(name = "logwarden-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to logwarden.toml configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,
}

impl DaemonCli {
    /// Whether `--config` points somewhere other than the default path.
    ///
    /// An explicitly given path must exist; the default path may be absent.
    pub fn config_is_explicit(&self) -> bool {
        self.config != PathBuf::from(DEFAULT_CONFIG_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_arguments() {
        let cli = DaemonCli::parse_from(["logwarden-daemon"]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert!(cli.log_level.is_none());
        assert!(cli.log_format.is_none());
        assert!(!cli.validate);
        assert!(!cli.config_is_explicit());
    }

    #[test]
    fn explicit_config_path_is_detected() {
        let cli = DaemonCli::parse_from(["logwarden-daemon", "--config", "/etc/lw.toml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/lw.toml"));
        assert!(cli.config_is_explicit());
    }

    #[test]
    fn overrides_and_validate_flag() {
        let cli = DaemonCli::parse_from([
            "logwarden-daemon",
            "--log-level",
            "debug",
            "--log-format",
            "pretty",
            "--validate",
        ]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format.as_deref(), Some("pretty"));
        assert!(cli.validate);
    }
}
