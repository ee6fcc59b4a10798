// SPDX-FileCopyrightText: 2026 Wahook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wahook - webhook ingestion, recovery, and automation rules.
//!
//! This is the binary entry point for the Wahook engine.

use clap::{Parser, Subcommand};

mod serve;
mod shutdown;

/// Wahook - webhook ingestion, recovery, and automation rules.
#[derive(Parser, Debug)]
#[command(name = "wahook", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook ingress and background workers.
    Serve,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match wahook_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            wahook_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("error: could not render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("wahook: use --help for available commands");
        }
    }
}
