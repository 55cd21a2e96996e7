use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Editor backend for coderabbit reviews
#[derive(Parser, Debug, Clone)]
#[command(name = "vim4rabbit", version, about, disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Path to config file (default: ~/.vim4rabbit/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Review CLI binary to invoke (default: coderabbit)
    #[arg(long, global = true)]
    pub cli_binary: Option<String>,

    /// Review timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Directory holding the usage cache (default: ~/.vim4rabbit)
    #[arg(long, global = true)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Run a review and print the result as JSON
    Review,

    /// Print token usage as JSON
    Usage {
        /// Read the local cache only, without calling the CLI
        #[arg(long)]
        cached: bool,
    },

    /// Print the help buffer lines as JSON
    Help {
        /// Window width to lay the columns out for
        #[arg(long, default_value_t = 80)]
        width: usize,
    },

    /// Speak the editor's JSON channel protocol on stdin/stdout
    Serve,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_review() {
        let cli = Cli::parse_from(["vim4rabbit", "review"]);
        assert_eq!(cli.command, CliCommand::Review);
        assert!(cli.config.is_none());
        assert!(cli.cli_binary.is_none());
        assert!(cli.timeout.is_none());
    }

    #[test]
    fn test_parse_usage_cached() {
        let cli = Cli::parse_from(["vim4rabbit", "usage", "--cached"]);
        assert_eq!(cli.command, CliCommand::Usage { cached: true });

        let cli = Cli::parse_from(["vim4rabbit", "usage"]);
        assert_eq!(cli.command, CliCommand::Usage { cached: false });
    }

    #[test]
    fn test_parse_help_width() {
        let cli = Cli::parse_from(["vim4rabbit", "help"]);
        assert_eq!(cli.command, CliCommand::Help { width: 80 });

        let cli = Cli::parse_from(["vim4rabbit", "help", "--width", "120"]);
        assert_eq!(cli.command, CliCommand::Help { width: 120 });
    }

    #[test]
    fn test_parse_global_args_after_subcommand() {
        let cli = Cli::parse_from([
            "vim4rabbit",
            "serve",
            "--cli-binary",
            "/opt/cr",
            "--timeout",
            "30",
            "--cache-dir",
            "/tmp/cache",
            "--config",
            "/tmp/c.toml",
        ]);
        assert_eq!(cli.command, CliCommand::Serve);
        assert_eq!(cli.cli_binary.as_deref(), Some("/opt/cr"));
        assert_eq!(cli.timeout, Some(30));
        assert_eq!(cli.cache_dir, Some(PathBuf::from("/tmp/cache")));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["vim4rabbit"]).is_err());
    }
}
