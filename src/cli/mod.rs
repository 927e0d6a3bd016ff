//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "faqrag",
    version,
    about = "Grounded FAQ answering over a passage index",
    long_about = "faqrag answers questions from a pre-built passage index: it retrieves the closest \
                  passages, asks the first available language model to answer from them, and falls \
                  back to TF-IDF matching over the FAQ corpus when no model answer is usable."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/faqrag/config.toml)
    #[arg(short, long, global = true, value_name = "FILE", env = "FAQRAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (host:port); overrides server.bind
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Answer a single question through the full pipeline
    Ask {
        /// Question to ask
        question: String,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show topic counts and tail latency from the request log
    Metrics {
        /// Print metrics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["faqrag", "-v", "ask", "giá bao nhiêu", "--json"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Ask { question, json } => {
                assert_eq!(question, "giá bao nhiêu");
                assert!(json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_bind() {
        let cli = Cli::try_parse_from(["faqrag", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { bind: Some(ref b) } if b == "0.0.0.0:9000"
        ));
    }
}
