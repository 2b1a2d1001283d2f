/// CLI argument parsing and command handling

use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Build timestamp injected at compile time
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "kontalk-cli")]
#[command(author, version = VERSION_WITH_BUILD, about, long_about = None)]
pub struct Cli {
    /// Path to the instance configuration file (default: local.properties
    /// in the project root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show service status
    Status,

    /// Create the instance: bring the stack up and write the version marker
    Bootstrap,

    /// Start all services or a specific one
    Start {
        /// Specific service to start (db, httpupload, xmpp)
        service: Option<String>,
    },

    /// Stop services
    Stop {
        /// Stop all services
        #[arg(short, long, conflicts_with = "service")]
        all: bool,

        /// Specific service to stop
        #[arg(required_unless_present = "all")]
        service: Option<String>,
    },

    /// Restart a service
    Restart {
        /// Service to restart
        service: String,
    },

    /// View logs
    Logs {
        /// Service name
        service: String,

        /// Follow log output
        #[arg(short, long)]
        follow: bool,

        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "100")]
        tail: usize,
    },

    /// Snapshot the database, upload storage and key store into one archive
    Backup,

    /// List archives in the backup destination
    Backups,

    /// Replace all instance data with an archive's contents (destructive)
    Restore {
        /// Archive to restore from
        archive: PathBuf,

        /// Give up after this many database readiness attempts instead of
        /// waiting forever
        #[arg(long)]
        wait_attempts: Option<u32>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_stop_requires_a_target() {
        assert!(Cli::try_parse_from(["kontalk-cli", "stop"]).is_err());
        assert!(Cli::try_parse_from(["kontalk-cli", "stop", "--all", "db"]).is_err());
        assert!(Cli::try_parse_from(["kontalk-cli", "stop", "--all"]).is_ok());
        assert!(Cli::try_parse_from(["kontalk-cli", "stop", "db"]).is_ok());
    }
}
