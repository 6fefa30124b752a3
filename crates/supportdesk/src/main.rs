// SPDX-FileCopyrightText: 2026 Supportdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supportdesk - client-to-staff support conversations.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use supportdesk_config::{ConfigError, SupportdeskConfig};

/// Supportdesk - client-to-staff support conversations.
#[derive(Parser, Debug)]
#[command(name = "supportdesk", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP/WebSocket server.
    Serve {
        /// Read configuration from this file instead of the standard locations.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Manage Supportdesk configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
    /// Bearer token helpers.
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Load and validate configuration, reporting every problem found.
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommands {
    /// Print the `token_sha256` value for an `[[identities]]` entry.
    Hash { token: String },
}

fn load(path: Option<&PathBuf>) -> Result<SupportdeskConfig, Vec<ConfigError>> {
    match path {
        Some(path) => supportdesk_config::load_and_validate_path(path),
        None => supportdesk_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve { config }) => {
            let config = match load(config.as_ref()) {
                Ok(config) => config,
                Err(errors) => {
                    supportdesk_config::render_errors(&errors);
                    std::process::exit(1);
                }
            };
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("supportdesk: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config {
            action: ConfigCommands::Check { config },
        }) => match load(config.as_ref()) {
            Ok(config) => {
                println!(
                    "supportdesk: config OK (listen={}:{}, database={}, identities={})",
                    config.server.host,
                    config.server.port,
                    config.storage.database_path,
                    config.identities.len()
                );
            }
            Err(errors) => {
                supportdesk_config::render_errors(&errors);
                eprintln!("supportdesk: {} configuration error(s)", errors.len());
                std::process::exit(1);
            }
        },
        Some(Commands::Token {
            action: TokenCommands::Hash { token },
        }) => {
            println!("{}", supportdesk_auth::hash_token(&token));
        }
        None => {
            println!("supportdesk: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_token_hash() {
        let cli = Cli::try_parse_from(["supportdesk", "token", "hash", "s3cret"]).unwrap();
        match cli.command {
            Some(Commands::Token {
                action: TokenCommands::Hash { token },
            }) => assert_eq!(token, "s3cret"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_config_check_with_path() {
        let cli =
            Cli::try_parse_from(["supportdesk", "config", "check", "--config", "/tmp/sd.toml"])
                .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigCommands::Check { config: Some(_) }
            })
        ));
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = supportdesk_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.server.port, 8080);
    }
}
