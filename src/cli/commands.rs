//! CLI command implementations

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::accounts::{SlotType, TrayAccount};
use crate::config::Config;
use crate::keys::{self, DerivationPath, MnemonicPhrase, WordCount};
use crate::merkle;
use crate::tray::{InternalExchange, Tray};

/// Derive a single key
pub fn derive(phrase: &str, path: &str, password: Option<&str>) -> Result<()> {
    let mnemonic = MnemonicPhrase::new(phrase)?;
    let mut path = DerivationPath::from_str(path)?;
    if let Some(password) = password {
        path = path.with_password(password);
    }

    let seed = mnemonic.seed(path.password().unwrap_or_default());
    let (key_pair, chain_code) = keys::derive(&path, &seed)?;

    println!("Path:       {}", path);
    println!("Public key: {}", key_pair.public_key());
    println!("Chain code: {}", hex::encode(chain_code));
    Ok(())
}

/// List every tray account for a mnemonic
pub fn accounts(config: &Config, phrase: &str) -> Result<()> {
    let mnemonic = MnemonicPhrase::new(phrase)?;
    let tray = Tray::with_params(&mnemonic, config.timelock_params()?)?;

    println!("\n=== TRAY ACCOUNTS ===\n");
    println!("{:<14} {:>5}  {:<44}  {:<44}", "Account", "Index", "Authority", "Vault");
    for (account, cluster) in tray.all_accounts() {
        println!(
            "{:<14} {:>5}  {:<44}  {:<44}",
            account.to_string(),
            cluster.index(),
            cluster.authority_public_key().to_string(),
            cluster.vault_public_key().to_string()
        );
    }
    Ok(())
}

/// Print a fresh random mnemonic
pub fn generate(words: usize) -> Result<()> {
    let count = WordCount::from_words(words)?;
    let mnemonic = MnemonicPhrase::generate(count)?;
    warn!("Anyone with this phrase controls the funds derived from it");
    println!("{}", mnemonic.phrase());
    Ok(())
}

/// Redistribute a simulated tray and print the exchanges
pub fn redistribute(config: &Config, phrase: Option<&str>, bills: &[u64]) -> Result<()> {
    let mut tray = simulated_tray(config, phrase, bills)?;
    let before = tray.slots_balance();

    let exchanges = tray.redistribute()?;
    info!(
        balance = before,
        exchanges = exchanges.len(),
        "Redistributed simulated tray"
    );

    print_exchanges(&exchanges)?;
    print_bills(&tray);
    Ok(())
}

/// Transfer out of a simulated tray and print the exchanges
pub fn transfer(config: &Config, phrase: Option<&str>, bills: &[u64], amount: u64) -> Result<()> {
    let mut tray = simulated_tray(config, phrase, bills)?;
    let before = tray.slots_balance();

    let exchanges = tray.transfer(amount)?;
    info!(
        amount,
        balance = before,
        exchanges = exchanges.len(),
        "Transferred from simulated tray"
    );

    print_exchanges(&exchanges)?;
    print_bills(&tray);
    Ok(())
}

/// Check a Merkle inclusion proof
pub fn verify_proof(leaf: &str, root: &str, proof: &[String]) -> Result<()> {
    let leaf = parse_leaf(leaf);
    let root = merkle::parse_hash(root).context("Invalid root")?;
    let proof = proof
        .iter()
        .enumerate()
        .map(|(i, node)| merkle::parse_hash(node).with_context(|| format!("Invalid proof node {}", i)))
        .collect::<Result<Vec<_>>>()?;

    let contained = merkle::verify_contained(&leaf, &root, &proof);
    debug!(nodes = proof.len(), contained, "Verified proof");
    println!("{}", contained);
    Ok(())
}

/// Show effective configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.display());
    Ok(())
}

/// Tray seeded with `bills` per slot, smallest first
fn simulated_tray(config: &Config, phrase: Option<&str>, bills: &[u64]) -> Result<Tray> {
    if bills.len() != SlotType::ALL.len() {
        anyhow::bail!(
            "Expected {} bill counts (smallest slot first), got {}",
            SlotType::ALL.len(),
            bills.len()
        );
    }

    let mnemonic = match phrase {
        Some(phrase) => MnemonicPhrase::new(phrase)?,
        None => {
            debug!("No mnemonic given, simulating with a random one");
            MnemonicPhrase::generate(WordCount::Twelve)?
        }
    };

    let mut tray = Tray::with_params(&mnemonic, config.timelock_params()?)?
        .with_max_bills(config.tray.max_bills_per_exchange)?;

    let mut balances = HashMap::new();
    for (slot, count) in SlotType::ALL.iter().zip(bills) {
        let balance = count
            .checked_mul(slot.bill_value())
            .with_context(|| format!("Too many bills for slot {}", slot))?;
        balances.insert(TrayAccount::Bucket(*slot), balance);
    }
    tray.set_balances(&balances)?;

    Ok(tray)
}

/// Hex or base58 when the input decodes, raw bytes otherwise
fn parse_leaf(leaf: &str) -> Vec<u8> {
    if leaf.len() % 2 == 0 {
        if let Ok(bytes) = hex::decode(leaf) {
            return bytes;
        }
    }
    if let Ok(bytes) = bs58::decode(leaf).into_vec() {
        if bytes.len() == 32 {
            return bytes;
        }
    }
    leaf.as_bytes().to_vec()
}

fn print_exchanges(exchanges: &[InternalExchange]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(exchanges)?);
    Ok(())
}

fn print_bills(tray: &Tray) {
    println!("\n=== SLOTS ===\n");
    for slot in tray.slots() {
        println!(
            "{:>4}: {:>6} bills ({})",
            slot.slot_type.to_string(),
            slot.bill_count(),
            slot.partial_balance
        );
    }
    println!("\nBalance: {}", tray.slots_balance());
    if tray.dust() > 0 {
        println!("Dust:    {}", tray.dust());
    }
}
