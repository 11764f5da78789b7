//! Tray wallet CLI - derive accounts and simulate denomination exchanges
//!
//! Nothing here touches the network. Transfers and redistributions run
//! against a locally seeded tray and print the exchanges they would issue.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use tray_wallet::cli::commands;
use tray_wallet::config::{Config, LoggingConfig};

/// Tray wallet - denomination engine and key derivation
#[derive(Parser)]
#[command(name = "tray")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the key at a path
    Derive {
        #[arg(long, env = "TRAY_MNEMONIC", hide_env_values = true)]
        mnemonic: String,

        /// e.g. "m/44'/501'/0'/0'" or "m/44'/501'/0'/0'/0'/0#getcode.com"
        #[arg(long, default_value = "m/44'/501'/0'/0'")]
        path: String,

        /// BIP39 password, overrides one given in the path
        #[arg(long)]
        password: Option<String>,
    },

    /// List every tray account with its vault
    Accounts {
        #[arg(long, env = "TRAY_MNEMONIC", hide_env_values = true)]
        mnemonic: String,
    },

    /// Generate a new mnemonic
    Generate {
        /// 12 or 24
        #[arg(long, default_value = "12")]
        words: usize,
    },

    /// Simulate redistributing a tray
    Redistribute {
        /// Bills per slot, smallest first: 1,10,100,1k,10k,100k,1m
        #[arg(long, value_delimiter = ',', required = true)]
        bills: Vec<u64>,

        #[arg(long, env = "TRAY_MNEMONIC", hide_env_values = true)]
        mnemonic: Option<String>,
    },

    /// Simulate sending an amount out of a tray
    Transfer {
        /// Bills per slot, smallest first: 1,10,100,1k,10k,100k,1m
        #[arg(long, value_delimiter = ',', required = true)]
        bills: Vec<u64>,

        #[arg(long)]
        amount: u64,

        #[arg(long, env = "TRAY_MNEMONIC", hide_env_values = true)]
        mnemonic: Option<String>,
    },

    /// Verify a Merkle inclusion proof
    VerifyProof {
        /// Hex, base58, or raw text
        #[arg(long)]
        leaf: String,

        /// Hex or base58
        #[arg(long)]
        root: String,

        /// Sibling hashes, leaf level first
        #[arg(long, value_delimiter = ',')]
        proof: Vec<String>,
    },

    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Logging settings come from config, so load it first and report failures once tracing is up
    let config = Config::load(&cli.config);
    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging, cli.json_logs);

    let config = match config {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Derive {
            mnemonic,
            path,
            password,
        } => commands::derive(&mnemonic, &path, password.as_deref()),
        Commands::Accounts { mnemonic } => commands::accounts(&config, &mnemonic),
        Commands::Generate { words } => commands::generate(words),
        Commands::Redistribute { bills, mnemonic } => {
            commands::redistribute(&config, mnemonic.as_deref(), &bills)
        }
        Commands::Transfer {
            bills,
            amount,
            mnemonic,
        } => commands::transfer(&config, mnemonic.as_deref(), &bills, amount),
        Commands::VerifyProof { leaf, root, proof } => commands::verify_proof(&leaf, &root, &proof),
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(logging: &LoggingConfig, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tray_wallet={}", logging.level)));

    if json || logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
