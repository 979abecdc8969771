//! CLI command definitions for the `persona` binary.

pub mod check;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Serve AI agent personas over HTTP.
#[derive(Parser)]
#[command(name = "persona", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Suppress all logging except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// More logging (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Address to bind (overrides `[server] host`).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides `[server] port`).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the resolved configuration.
    CheckConfig {
        /// Output machine-readable JSON instead of styled text.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        <Cli as clap::CommandFactory>::command().debug_assert();
    }

    #[test]
    fn test_serve_overrides_parse() {
        let cli = Cli::parse_from(["persona", "-vv", "serve", "--port", "9000"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Serve { host, port } => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["persona", "check-config", "--json", "--json-logs", "-q"]);
        assert!(cli.json_logs);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::CheckConfig { json: true }));
    }
}
