//! Timelock program constants
//!
//! Every logical account is a timelock state account plus the token vault
//! it controls. Both are program-derived addresses of the timelock program.

use solana_sdk::pubkey::Pubkey;

/// Timelock program ID
pub const TIMELOCK_PROGRAM_ID: Pubkey = solana_sdk::pubkey!("time2Z2SCnn3qYg3ULKVtdkh8YmZ5jFdKicnA1W2YnJ");

/// Mint of the token held in every vault
pub const KIN_MINT: Pubkey = solana_sdk::pubkey!("kinXdEcpDQeHPEuQnqmUgtYykqKGVFq6CeVX5iAHJq6");

/// Co-signing time authority
pub const TIME_AUTHORITY: Pubkey = solana_sdk::pubkey!("codeHy87wGD5oMRLG75qKqsSi1vWE3oxNyYmXo5F9YR");

pub const DEFAULT_LOCKOUT_DAYS: u8 = 21;
pub const DEFAULT_DATA_VERSION: u8 = 3;

pub const STATE_SEED_PREFIX: &[u8] = b"timelock_state";
pub const VAULT_SEED_PREFIX: &[u8] = b"timelock_vault";

/// Inputs to the state and vault address derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelockParams {
    pub program_id: Pubkey,
    pub mint: Pubkey,
    pub time_authority: Pubkey,
    pub lockout_days: u8,
    pub data_version: u8,
}

impl TimelockParams {
    pub const MAINNET: TimelockParams = TimelockParams {
        program_id: TIMELOCK_PROGRAM_ID,
        mint: KIN_MINT,
        time_authority: TIME_AUTHORITY,
        lockout_days: DEFAULT_LOCKOUT_DAYS,
        data_version: DEFAULT_DATA_VERSION,
    };
}

impl Default for TimelockParams {
    fn default() -> Self {
        Self::MAINNET
    }
}
