//! Ecom CLI - database migrations and operator tooling.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! ecom-cli migrate
//!
//! # Hash an operator password for the operators file
//! ecom-cli operator hash-password 'correct horse battery staple'
//!
//! # Validate an operators file
//! ecom-cli operator check operators.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ecom-cli")]
#[command(author, version, about = "Ecom Admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Manage operators
    Operator {
        #[command(subcommand)]
        action: OperatorAction,
    },
}

#[derive(Subcommand)]
enum OperatorAction {
    /// Print an Argon2id hash for an operators file entry
    HashPassword {
        /// Password to hash; read from stdin when omitted
        password: Option<String>,
    },
    /// Load and validate an operators file
    Check {
        /// Path to the operators YAML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::print_stdout)]
async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Operator { action } => match action {
            OperatorAction::HashPassword { password } => {
                let password = match password {
                    Some(password) => password,
                    None => commands::operator::read_password_line(std::io::stdin().lock())?,
                };
                println!("{}", commands::operator::hash(&password)?);
            }
            OperatorAction::Check { file } => {
                let summary = commands::operator::check(&file)?;
                println!(
                    "{}: {} operator(s), {} admin(s)",
                    file.display(),
                    summary.operators,
                    summary.admins
                );
            }
        },
    }
    Ok(())
}
