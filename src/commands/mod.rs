pub mod capture;
pub mod config;
pub mod dashboard;
pub mod storage;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "aqi-monitor",
    version,
    about = "Read air quality values off a screen and chart them"
)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Watch the source and save a reading set every interval or on demand
    Run,
    /// Capture and save a single reading set, then exit
    Once,
    /// Serve the chart page and its JSON feed
    Dashboard {
        /// Overrides `dashboard.bind`
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Add the water-quality columns to an existing database
    Migrate,
    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file if it does not exist yet
        #[arg(long)]
        write_default: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let args = ["aqi-monitor", "run", "--config", "x.json", "--log-json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.command, Commands::Run);
        assert_eq!(cli.config, Some(PathBuf::from("x.json")));
        assert!(cli.log_json);
    }

    #[test]
    fn test_parse_dashboard_bind() {
        let args = ["aqi-monitor", "dashboard", "--bind", "127.0.0.1:8080"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(
            cli.command,
            Commands::Dashboard {
                bind: Some("127.0.0.1:8080".to_string())
            }
        );
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["aqi-monitor"]).is_err());
    }
}
