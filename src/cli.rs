use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Slotwatch - reservation availability inference from scraped page snapshots
#[derive(Debug, Parser)]
#[command(name = "slotwatch")]
#[command(
    about = "Infer a normalized availability timeline from booking-page snapshots",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Reference time zone, overriding the config
    #[arg(long, global = true)]
    pub timezone: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one extraction per snapshot, in order, printing the records as JSON lines
    Extract {
        /// Page snapshot files (JSON)
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,

        /// Pretty-print each invocation's records
        #[arg(long)]
        pretty: bool,
    },

    /// Extract from the snapshots and score the records against queries
    Score {
        /// Query file: a JSON list of alternative-condition lists
        #[arg(long, required = true)]
        queries: PathBuf,

        /// Page snapshot files (JSON)
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
    },

    /// View or write configuration
    Config {
        #[command(subcommand)]
        action: ConfigActions,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigActions {
    /// Print the effective configuration
    Show,
    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_args() {
        let cli = Cli::parse_from([
            "slotwatch",
            "extract",
            "a.json",
            "b.json",
            "--pretty",
            "--timezone",
            "UTC",
        ]);
        assert_eq!(cli.timezone.as_deref(), Some("UTC"));
        match cli.command {
            Commands::Extract { snapshots, pretty } => {
                assert_eq!(snapshots, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
                assert!(pretty);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_score_requires_queries() {
        assert!(Cli::try_parse_from(["slotwatch", "score", "a.json"]).is_err());
        let cli =
            Cli::try_parse_from(["slotwatch", "score", "--queries", "q.json", "a.json"]).unwrap();
        assert!(matches!(cli.command, Commands::Score { .. }));
    }
}
