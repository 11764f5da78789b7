//! Account clusters: a derived authority and its timelock accounts

use solana_sdk::pubkey::Pubkey;

use crate::accounts::timelock::{TimelockParams, STATE_SEED_PREFIX, VAULT_SEED_PREFIX};
use crate::error::{Error, Result};
use crate::keys::{DerivationPath, KeyPair, MnemonicPhrase};

/// A program-derived address and the bump that took it off the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramDerivedAccount {
    pub public_key: Pubkey,
    pub bump: u8,
}

impl ProgramDerivedAccount {
    fn find(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Self> {
        let (public_key, bump) = Pubkey::try_find_program_address(seeds, program_id)
            .ok_or_else(|| Error::Derivation("no viable program address bump".to_string()))?;
        Ok(Self { public_key, bump })
    }
}

/// The state account and vault owned by one authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelockDerivedAccounts {
    pub owner: Pubkey,
    pub state: ProgramDerivedAccount,
    pub vault: ProgramDerivedAccount,
}

impl TimelockDerivedAccounts {
    pub fn new(owner: &Pubkey, params: &TimelockParams) -> Result<Self> {
        let state = ProgramDerivedAccount::find(
            &[
                STATE_SEED_PREFIX,
                params.mint.as_ref(),
                params.time_authority.as_ref(),
                owner.as_ref(),
                &[params.lockout_days],
            ],
            &params.program_id,
        )?;

        let vault = ProgramDerivedAccount::find(
            &[
                VAULT_SEED_PREFIX,
                state.public_key.as_ref(),
                &[params.data_version],
            ],
            &params.program_id,
        )?;

        Ok(Self {
            owner: *owner,
            state,
            vault,
        })
    }
}

/// One usable on-chain account. A new index means a new cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCluster {
    index: u32,
    authority: KeyPair,
    timelock: TimelockDerivedAccounts,
}

impl AccountCluster {
    pub fn new(index: u32, authority: KeyPair) -> Result<Self> {
        Self::with_params(index, authority, &TimelockParams::default())
    }

    pub fn with_params(index: u32, authority: KeyPair, params: &TimelockParams) -> Result<Self> {
        let timelock = TimelockDerivedAccounts::new(&authority.public_key(), params)?;
        Ok(Self {
            index,
            authority,
            timelock,
        })
    }

    /// Derive the authority at `path` and build its cluster
    pub fn derive(
        index: u32,
        path: &DerivationPath,
        mnemonic: &MnemonicPhrase,
        params: &TimelockParams,
    ) -> Result<Self> {
        Self::with_params(index, KeyPair::derive(path, mnemonic)?, params)
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn authority(&self) -> &KeyPair {
        &self.authority
    }

    pub fn timelock(&self) -> &TimelockDerivedAccounts {
        &self.timelock
    }

    pub fn authority_public_key(&self) -> Pubkey {
        self.authority.public_key()
    }

    pub fn state_public_key(&self) -> Pubkey {
        self.timelock.state.public_key
    }

    pub fn vault_public_key(&self) -> Pubkey {
        self.timelock.vault.public_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_timelock_accounts_for_owner() {
        let owner = Pubkey::from_str("BuAprBZugjXG6QRbRQN8QKF8EzbW5SigkDuyR9KtqN5z").unwrap();
        let accounts = TimelockDerivedAccounts::new(&owner, &TimelockParams::default()).unwrap();

        assert_eq!(
            accounts.state.public_key.to_string(),
            "7Ema8Z4gAUWegampp2AuX4cvaTRy3VMwJUq8LMJshQTV"
        );
        assert_eq!(accounts.state.bump, 254);
        assert_eq!(
            accounts.vault.public_key.to_string(),
            "3538bYdWoRXUgBbyAyvG3Zemmawh75nmCQEvWc9DfKFR"
        );
        assert_eq!(accounts.vault.bump, 255);
    }

    #[test]
    fn test_cluster_from_mnemonic() {
        let mnemonic = MnemonicPhrase::new(
            "couple divorce usage surprise before range feature source bubble chunk spot away",
        )
        .unwrap();
        let cluster = AccountCluster::derive(
            0,
            &DerivationPath::solana(),
            &mnemonic,
            &TimelockParams::default(),
        )
        .unwrap();

        assert_eq!(
            cluster.authority_public_key().to_string(),
            "769viUZ9uFWmTrY5q2xQ7cBnhgxWw56N3Y8RE48EQxh4"
        );
        assert_eq!(
            cluster.state_public_key().to_string(),
            "6e2nnZXBJ1YhhbpoYzGxUh1i8NhBJ5vP4DHBrVEeZ5wJ"
        );
        assert_eq!(
            cluster.vault_public_key().to_string(),
            "ApHaQqxfeJacD2k2qVprjqGsbk6yRcEQ4Q78wMJhgMbX"
        );
    }

    #[test]
    fn test_params_change_addresses() {
        let owner = Pubkey::new_unique();
        let default = TimelockDerivedAccounts::new(&owner, &TimelockParams::default()).unwrap();
        let params = TimelockParams {
            lockout_days: 7,
            ..TimelockParams::default()
        };
        let other = TimelockDerivedAccounts::new(&owner, &params).unwrap();
        assert_ne!(default.state, other.state);
        assert_ne!(default.vault, other.vault);
    }
}
