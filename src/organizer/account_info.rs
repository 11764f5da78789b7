//! Externally reported account state
//!
//! An [`AccountInfo`] is what the ledger says about one vault. The organizer
//! treats it as the system of record for balances.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::accounts::{AccountType, Domain};

/// Whether the timelock authority can still co-sign for an account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementState {
    #[default]
    Unknown,
    /// Not managed, funds are never moved on the owner's behalf
    None,
    Locking,
    /// Funds are locked and co-signing is available
    Locked,
    Unlocking,
    /// Co-signing authority was given up
    Unlocked,
    Closing,
    /// Closed on chain, zero balance
    Closed,
}

impl ManagementState {
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Unknown,
            1 => Self::None,
            2 => Self::Locking,
            3 => Self::Locked,
            4 => Self::Unlocking,
            5 => Self::Unlocked,
            6 => Self::Closing,
            7 => Self::Closed,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockchainState {
    #[default]
    Unknown,
    DoesntExist,
    Exists,
}

impl BlockchainState {
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Unknown,
            1 => Self::DoesntExist,
            2 => Self::Exists,
            _ => return None,
        })
    }
}

/// Where a reported balance came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceSource {
    #[default]
    Unknown,
    /// Finalized chain state
    Blockchain,
    /// Cached server-side value, accurate only while locked
    Cache,
}

impl BalanceSource {
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Unknown,
            1 => Self::Blockchain,
            2 => Self::Cache,
            _ => return None,
        })
    }
}

/// Claim status for gift-card style accounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimState {
    #[default]
    Unknown,
    NotClaimed,
    Claimed,
    Expired,
}

impl ClaimState {
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Unknown,
            1 => Self::NotClaimed,
            2 => Self::Claimed,
            3 => Self::Expired,
            _ => return None,
        })
    }
}

/// Ledger view of a single vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// Derivation index, zero where it doesn't apply
    pub index: u32,
    pub account_type: AccountType,
    /// Vault address
    pub address: Pubkey,
    pub owner: Option<Pubkey>,
    pub authority: Option<Pubkey>,
    pub balance_source: BalanceSource,
    /// Whole units as observed by the server
    pub balance: u64,
    pub management_state: ManagementState,
    pub blockchain_state: BlockchainState,
    pub claim_state: ClaimState,
    /// Incoming accounts only: the client should rotate before reuse
    pub must_rotate: bool,
    /// Amount originally funded, for gift-card style accounts
    pub original_amount: Option<u64>,
    /// Set for relationship accounts
    pub relationship: Option<Domain>,
}

impl AccountInfo {
    /// A locked account at `address` with everything else defaulted
    pub fn new(index: u32, account_type: AccountType, address: Pubkey, balance: u64) -> Self {
        let relationship = account_type.relationship_domain().cloned();
        Self {
            index,
            account_type,
            address,
            owner: None,
            authority: None,
            balance_source: BalanceSource::Blockchain,
            balance,
            management_state: ManagementState::Locked,
            blockchain_state: BlockchainState::Exists,
            claim_state: ClaimState::Unknown,
            must_rotate: false,
            original_amount: None,
            relationship,
        }
    }

    /// Managed accounts are only usable while locked
    pub fn is_unusable(&self) -> bool {
        match self.management_state {
            ManagementState::None => false,
            state => state != ManagementState::Locked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::TrayAccount;

    fn info(state: ManagementState) -> AccountInfo {
        let mut info = AccountInfo::new(0, TrayAccount::Primary.into(), Pubkey::new_unique(), 5);
        info.management_state = state;
        info
    }

    #[test]
    fn test_unusable_states() {
        assert!(!info(ManagementState::Locked).is_unusable());
        assert!(!info(ManagementState::None).is_unusable());
        for state in [
            ManagementState::Unknown,
            ManagementState::Locking,
            ManagementState::Unlocking,
            ManagementState::Unlocked,
            ManagementState::Closing,
            ManagementState::Closed,
        ] {
            assert!(info(state).is_unusable(), "{:?}", state);
        }
    }

    #[test]
    fn test_state_values() {
        assert_eq!(ManagementState::from_i32(3), Some(ManagementState::Locked));
        assert_eq!(ManagementState::from_i32(8), None);
        assert_eq!(BlockchainState::from_i32(1), Some(BlockchainState::DoesntExist));
        assert_eq!(BalanceSource::from_i32(2), Some(BalanceSource::Cache));
        assert_eq!(ClaimState::from_i32(3), Some(ClaimState::Expired));
        assert_eq!(ClaimState::from_i32(-1), None);
    }

    #[test]
    fn test_relationship_carried_from_type() {
        let domain = Domain::new("getcode.com").unwrap();
        let info = AccountInfo::new(
            0,
            AccountType::relationship(domain.clone()),
            Pubkey::new_unique(),
            0,
        );
        assert_eq!(info.relationship, Some(domain));
    }
}
