// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! wagate - WhatsApp Business messaging gateway.
//!
//! This is the binary entry point for the gateway.

mod serve;
mod shutdown;

use clap::{Parser, Subcommand};

/// wagate - WhatsApp Business messaging gateway.
#[derive(Parser, Debug)]
#[command(name = "wagate", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway server.
    Serve,
    /// Validate configuration and print the effective values (secrets redacted).
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match wagate_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            wagate_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("wagate: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            println!("{config:#?}");
        }
        None => {
            println!("wagate: use --help for available commands");
        }
    }
}
