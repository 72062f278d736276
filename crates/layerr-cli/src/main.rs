//! Layerr Signer CLI
//!
//! Digest, sign and verify Layerr typed-data authorizations from the shell.

mod commands;

use std::path::{Path, PathBuf};

use alloy_primitives::Address;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use layerr_core::config::Config;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "layerr-sign", version, about = "Sign and verify Layerr authorizations")]
struct Cli {
    /// Optional config file; `LAYERR__`-prefixed variables override it.
    /// Without it, `LAYERR_*` variables and `.env` are read.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the digest of a typed-data document
    Digest {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Sign a typed-data document with the primary key
    Sign {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Check a signature over a typed-data document
    Verify {
        #[arg(short, long)]
        file: PathBuf,

        /// 65-byte signature as hex
        #[arg(long)]
        signature: String,

        /// Address expected to have signed
        #[arg(long)]
        signer: Address,
    },

    /// Print the address of a configured key
    Address {
        /// Use the oracle key instead of the primary key
        #[arg(long)]
        oracle: bool,
    },

    /// Oracle co-signature over a caller and a primary signature
    OracleAttest {
        /// Address that will submit the mint
        #[arg(long)]
        caller: Address,

        /// Primary signature over the mint parameters
        #[arg(long)]
        signature: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "layerr_cli=info,layerr_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<()> {
    // digest and verify never touch keys, so they run without config
    match cli.command {
        Command::Digest { file } => {
            let digest = commands::digest(&file)?;
            println!("{}", digest);
        }
        Command::Sign { file } => {
            let config = load_config(cli.config.as_deref())?;
            let signature = commands::sign(&config, &file).await?;
            println!("{}", signature);
        }
        Command::Verify {
            file,
            signature,
            signer,
        } => match commands::verify(&file, &signature, signer)? {
            Ok(recovered) => println!("valid {}", recovered.to_checksum(None)),
            Err(failure) => {
                println!("invalid: {}", failure);
                std::process::exit(1);
            }
        },
        Command::Address { oracle } => {
            let config = load_config(cli.config.as_deref())?;
            let address = commands::address(&config, oracle)?;
            println!("{}", address.to_checksum(None));
        }
        Command::OracleAttest { caller, signature } => {
            let config = load_config(cli.config.as_deref())?;
            let attestation = commands::oracle_attest(&config, caller, &signature).await?;
            info!(caller = %caller, "Oracle attestation produced");
            println!("{}", attestation);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::from_env().context("Failed to load config from environment"),
    }
}
