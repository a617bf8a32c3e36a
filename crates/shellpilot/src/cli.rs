//! Command-line interface definitions.

use clap::{Parser, Subcommand};

/// Shellpilot command-line interface.
#[derive(Debug, Parser)]
#[command(name = "shellpilot", version, about = "Oracle-driven container shell")]
pub struct Cli {
    /// Log level when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Drive a goal inside a container under oracle control.
    Run {
        /// What the oracle should accomplish.
        goal: String,

        /// Container image to boot.
        #[arg(long, default_value = "ubuntu")]
        image: String,
    },

    /// Boot a container and run a single command, no oracle involved.
    Exec {
        /// The command to execute.
        command: String,

        /// Container image to boot.
        #[arg(long, default_value = "ubuntu")]
        image: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "shellpilot",
            "run",
            "list files",
            "--image",
            "alpine:3.19",
        ])
        .unwrap();
        match cli.command {
            Commands::Run { goal, image } => {
                assert_eq!(goal, "list files");
                assert_eq!(image, "alpine:3.19");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_exec_with_default_image() {
        let cli = Cli::try_parse_from(["shellpilot", "exec", "ls -la"]).unwrap();
        match cli.command {
            Commands::Exec { command, image } => {
                assert_eq!(command, "ls -la");
                assert_eq!(image, "ubuntu");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["shellpilot"]).is_err());
    }
}
