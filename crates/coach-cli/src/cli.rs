//! Command-line interface definition using clap.

use clap::{Parser, Subcommand};

/// Live interview coach - streams multi-agent analysis of a transcript
#[derive(Parser, Debug)]
#[command(name = "coach")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read transcript lines from stdin and print coaching events
    Run {
        /// Use canned agent responses instead of calling a model
        #[arg(long)]
        offline: bool,

        /// Session identifier
        #[arg(short, long, default_value = "interview")]
        session: String,

        /// Description of the procedure being documented
        #[arg(short, long)]
        domain: Option<String>,

        /// Topics the interview should cover (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        topics: Vec<String>,

        /// Model identifier (overrides OPENROUTER_MODEL)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print the effective configuration as JSON
    Config,
}

impl Cli {
    /// Get the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["coach", "run"]).unwrap();
        match cli.command {
            Commands::Run {
                offline,
                session,
                domain,
                topics,
                model,
            } => {
                assert!(!offline);
                assert_eq!(session, "interview");
                assert!(domain.is_none());
                assert!(topics.is_empty());
                assert!(model.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_options() {
        let cli = Cli::try_parse_from([
            "coach",
            "run",
            "--offline",
            "-s",
            "pump-42",
            "--domain",
            "Pump overhaul",
            "--topics",
            "isolation,draining",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                offline,
                session,
                domain,
                topics,
                ..
            } => {
                assert!(offline);
                assert_eq!(session, "pump-42");
                assert_eq!(domain.as_deref(), Some("Pump overhaul"));
                assert_eq!(topics, vec!["isolation", "draining"]);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_config() {
        let cli = Cli::try_parse_from(["coach", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_cli_verbose() {
        let cli = Cli::try_parse_from(["coach", "-vvv", "config"]).unwrap();
        assert_eq!(cli.verbose, 3);
        assert_eq!(cli.log_level(), tracing::Level::TRACE);

        let cli = Cli::try_parse_from(["coach", "config"]).unwrap();
        assert_eq!(cli.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["coach"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
