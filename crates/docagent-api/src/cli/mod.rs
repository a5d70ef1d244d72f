//! CLI command definitions for the `docagent` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod messages;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use docagent_observe::tracing_setup::{LogFormat, TracingOptions};

/// Document-generation chat agent backed by Gemini.
#[derive(Parser)]
#[command(name = "docagent", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Directory holding config.toml, the database and working files.
    #[arg(long, env = "DOCAGENT_DATA_DIR", default_value = ".", global = true)]
    pub data_dir: PathBuf,

    /// Log line format: text or json.
    #[arg(long, env = "DOCAGENT_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server.
    Serve {
        /// Address to bind (overrides [server].host).
        #[arg(long, env = "HOST")]
        host: Option<String>,

        /// Port to listen on (overrides [server].port).
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Print the stored history of a session.
    Messages {
        /// Session id as sent in `sessionId`.
        session_id: String,

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

impl Cli {
    /// Load `.env` into the process environment, then parse arguments.
    ///
    /// `.env` must be read first so it can feed the `env` fallbacks above.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    /// Default tracing directive for the chosen verbosity.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 if self.quiet => "error",
            0 => "info",
            1 => "info,docagent_core=debug,docagent_infra=debug,docagent_api=debug",
            _ => "trace",
        }
    }

    pub fn tracing_options(&self) -> TracingOptions {
        TracingOptions {
            default_directive: self.log_filter().to_string(),
            format: self.log_format,
            enable_otel: self.otel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from(["docagent", "serve", "--port", "8080", "--host", "127.0.0.1"])
            .unwrap();
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(8080));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_verbosity_picks_filter() {
        let quiet = Cli::try_parse_from(["docagent", "-q", "messages", "s1"]).unwrap();
        assert_eq!(quiet.log_filter(), "error");

        let trace = Cli::try_parse_from(["docagent", "-vv", "messages", "s1", "--json"]).unwrap();
        assert_eq!(trace.log_filter(), "trace");
    }

    #[test]
    fn test_log_format_flag() {
        let cli = Cli::try_parse_from(["docagent", "--log-format", "json", "serve"]).unwrap();
        let options = cli.tracing_options();
        assert_eq!(options.format, LogFormat::Json);
        assert!(!options.enable_otel);
    }

    #[test]
    fn test_dotenv_values_feed_env_fallbacks() {
        let dir = tempfile::tempdir().unwrap();
        let env_file = dir.path().join(".env");
        std::fs::write(&env_file, "DOCAGENT_LOG_FORMAT=json\n").unwrap();
        dotenvy::from_path(&env_file).unwrap();

        let cli = Cli::try_parse_from(["docagent", "serve"]).unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
    }
}
