pub mod args;
pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DART disclosure gateway
#[derive(Parser, Debug)]
#[command(
    name = "dart-gateway",
    about = "HTTP gateway for the Korean DART disclosure registry",
    version,
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (YAML)
    #[arg(short, long, global = true, env = "DART_GATEWAY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    #[command(alias = "s")]
    Serve(args::ServeArgs),

    /// Print the effective configuration
    #[command(alias = "c")]
    Config,

    /// Show version information
    Version,
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> crate::error::Result<()> {
        let cli = Self::parse();

        // The server logs requests at info, so that is the quiet default
        if cli.verbose {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
                .init();
        } else {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
        }

        let config_path = cli.config.as_deref();
        match cli.command {
            Commands::Serve(args) => commands::serve::execute(args, config_path).await,
            Commands::Config => commands::config::execute(config_path),
            Commands::Version => {
                commands::version::execute();
                Ok(())
            }
        }
    }
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
    fn test_parse_serve_overrides() {
        let cli = Cli::try_parse_from([
            "dart-gateway",
            "--config",
            "/tmp/gw.yaml",
            "serve",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/gw.yaml")));
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.host.as_deref(), Some("127.0.0.1"));
                assert_eq!(args.port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
