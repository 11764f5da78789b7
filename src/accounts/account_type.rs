//! Logical account roles and their derivation paths
//!
//! Roles are split into the accounts the tray manages and the accounts
//! that live outside it. Tray operations only accept [`TrayAccount`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::accounts::domain::Domain;
use crate::keys::DerivationPath;

/// Fixed denominations, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Bucket1,
    Bucket10,
    Bucket100,
    Bucket1k,
    Bucket10k,
    Bucket100k,
    Bucket1m,
}

impl SlotType {
    pub const ALL: [SlotType; 7] = [
        SlotType::Bucket1,
        SlotType::Bucket10,
        SlotType::Bucket100,
        SlotType::Bucket1k,
        SlotType::Bucket10k,
        SlotType::Bucket100k,
        SlotType::Bucket1m,
    ];

    /// Position in the tray, 0 is the smallest denomination
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn bill_value(&self) -> u64 {
        match self {
            SlotType::Bucket1 => 1,
            SlotType::Bucket10 => 10,
            SlotType::Bucket100 => 100,
            SlotType::Bucket1k => 1_000,
            SlotType::Bucket10k => 10_000,
            SlotType::Bucket100k => 100_000,
            SlotType::Bucket1m => 1_000_000,
        }
    }

    pub fn derivation_path(&self) -> DerivationPath {
        // Bill values are at most 1_000_000, well inside u32
        DerivationPath::bucket(self.bill_value() as u32)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SlotType::Bucket1 => "1",
            SlotType::Bucket10 => "10",
            SlotType::Bucket100 => "100",
            SlotType::Bucket1k => "1k",
            SlotType::Bucket10k => "10k",
            SlotType::Bucket100k => "100k",
            SlotType::Bucket1m => "1m",
        };
        f.write_str(label)
    }
}

/// Temporary accounts whose address rotates with an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexedAccount {
    Incoming,
    Outgoing,
}

impl IndexedAccount {
    pub fn derivation_path(&self, index: u32) -> DerivationPath {
        match self {
            IndexedAccount::Incoming => DerivationPath::bucket_incoming(index),
            IndexedAccount::Outgoing => DerivationPath::bucket_outgoing(index),
        }
    }
}

/// Accounts whose funds can be received into the slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositAccount {
    Primary,
    Incoming,
}

/// Accounts owned by the tray
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrayAccount {
    Primary,
    Incoming,
    Outgoing,
    Bucket(SlotType),
}

impl TrayAccount {
    pub fn indexed(&self) -> Option<IndexedAccount> {
        match self {
            TrayAccount::Incoming => Some(IndexedAccount::Incoming),
            TrayAccount::Outgoing => Some(IndexedAccount::Outgoing),
            TrayAccount::Primary | TrayAccount::Bucket(_) => None,
        }
    }

    pub fn deposit(&self) -> Option<DepositAccount> {
        match self {
            TrayAccount::Primary => Some(DepositAccount::Primary),
            TrayAccount::Incoming => Some(DepositAccount::Incoming),
            TrayAccount::Outgoing | TrayAccount::Bucket(_) => None,
        }
    }

    pub fn derivation_path(&self, index: u32) -> DerivationPath {
        match self {
            TrayAccount::Primary => DerivationPath::solana(),
            TrayAccount::Incoming => IndexedAccount::Incoming.derivation_path(index),
            TrayAccount::Outgoing => IndexedAccount::Outgoing.derivation_path(index),
            TrayAccount::Bucket(slot) => slot.derivation_path(),
        }
    }
}

impl From<IndexedAccount> for TrayAccount {
    fn from(account: IndexedAccount) -> Self {
        match account {
            IndexedAccount::Incoming => TrayAccount::Incoming,
            IndexedAccount::Outgoing => TrayAccount::Outgoing,
        }
    }
}

impl From<DepositAccount> for TrayAccount {
    fn from(account: DepositAccount) -> Self {
        match account {
            DepositAccount::Primary => TrayAccount::Primary,
            DepositAccount::Incoming => TrayAccount::Incoming,
        }
    }
}

impl fmt::Display for TrayAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrayAccount::Primary => write!(f, "primary"),
            TrayAccount::Incoming => write!(f, "incoming"),
            TrayAccount::Outgoing => write!(f, "outgoing"),
            TrayAccount::Bucket(slot) => write!(f, "bucket({})", slot),
        }
    }
}

/// Accounts derived from the same mnemonic but not managed by the tray
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalAccount {
    /// Gift card account, derived from its own mnemonic at the owner path
    RemoteSend,
    Relationship(Domain),
    Swap,
}

impl ExternalAccount {
    pub fn derivation_path(&self) -> DerivationPath {
        match self {
            ExternalAccount::RemoteSend => DerivationPath::solana(),
            ExternalAccount::Relationship(domain) => DerivationPath::relationship(domain.as_str()),
            ExternalAccount::Swap => DerivationPath::swap(),
        }
    }
}

impl fmt::Display for ExternalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalAccount::RemoteSend => write!(f, "remote_send"),
            ExternalAccount::Relationship(domain) => write!(f, "relationship({})", domain),
            ExternalAccount::Swap => write!(f, "swap"),
        }
    }
}

/// Every logical account role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Tray(TrayAccount),
    External(ExternalAccount),
}

impl AccountType {
    pub const PRIMARY: AccountType = AccountType::Tray(TrayAccount::Primary);
    pub const INCOMING: AccountType = AccountType::Tray(TrayAccount::Incoming);
    pub const OUTGOING: AccountType = AccountType::Tray(TrayAccount::Outgoing);

    pub fn bucket(slot: SlotType) -> Self {
        AccountType::Tray(TrayAccount::Bucket(slot))
    }

    pub fn relationship(domain: Domain) -> Self {
        AccountType::External(ExternalAccount::Relationship(domain))
    }

    /// Only incoming and outgoing depend on `index`
    pub fn derivation_path(&self, index: u32) -> DerivationPath {
        match self {
            AccountType::Tray(account) => account.derivation_path(index),
            AccountType::External(account) => account.derivation_path(),
        }
    }

    pub fn as_tray(&self) -> Option<TrayAccount> {
        match self {
            AccountType::Tray(account) => Some(*account),
            AccountType::External(_) => None,
        }
    }

    pub fn relationship_domain(&self) -> Option<&Domain> {
        match self {
            AccountType::External(ExternalAccount::Relationship(domain)) => Some(domain),
            _ => None,
        }
    }

    /// Protocol representation plus relationship metadata
    pub fn to_wire(&self) -> (WireAccountType, Option<Domain>) {
        let wire = match self {
            AccountType::Tray(TrayAccount::Primary) => WireAccountType::Primary,
            AccountType::Tray(TrayAccount::Incoming) => WireAccountType::TemporaryIncoming,
            AccountType::Tray(TrayAccount::Outgoing) => WireAccountType::TemporaryOutgoing,
            AccountType::Tray(TrayAccount::Bucket(slot)) => match slot {
                SlotType::Bucket1 => WireAccountType::Bucket1Kin,
                SlotType::Bucket10 => WireAccountType::Bucket10Kin,
                SlotType::Bucket100 => WireAccountType::Bucket100Kin,
                SlotType::Bucket1k => WireAccountType::Bucket1000Kin,
                SlotType::Bucket10k => WireAccountType::Bucket10000Kin,
                SlotType::Bucket100k => WireAccountType::Bucket100000Kin,
                SlotType::Bucket1m => WireAccountType::Bucket1000000Kin,
            },
            AccountType::External(ExternalAccount::RemoteSend) => WireAccountType::RemoteSendGiftCard,
            AccountType::External(ExternalAccount::Relationship(domain)) => {
                return (WireAccountType::Relationship, Some(domain.clone()))
            }
            AccountType::External(ExternalAccount::Swap) => WireAccountType::Swap,
        };
        (wire, None)
    }

    /// Inverse of [`AccountType::to_wire`]. Anything without a supported
    /// counterpart maps to `None`.
    pub fn from_wire(wire: WireAccountType, relationship: Option<&Domain>) -> Option<Self> {
        let account = match wire {
            WireAccountType::Primary => Self::PRIMARY,
            WireAccountType::TemporaryIncoming => Self::INCOMING,
            WireAccountType::TemporaryOutgoing => Self::OUTGOING,
            WireAccountType::Bucket1Kin => Self::bucket(SlotType::Bucket1),
            WireAccountType::Bucket10Kin => Self::bucket(SlotType::Bucket10),
            WireAccountType::Bucket100Kin => Self::bucket(SlotType::Bucket100),
            WireAccountType::Bucket1000Kin => Self::bucket(SlotType::Bucket1k),
            WireAccountType::Bucket10000Kin => Self::bucket(SlotType::Bucket10k),
            WireAccountType::Bucket100000Kin => Self::bucket(SlotType::Bucket100k),
            WireAccountType::Bucket1000000Kin => Self::bucket(SlotType::Bucket1m),
            WireAccountType::RemoteSendGiftCard => AccountType::External(ExternalAccount::RemoteSend),
            WireAccountType::Relationship => Self::relationship(relationship?.clone()),
            WireAccountType::Swap => AccountType::External(ExternalAccount::Swap),
            WireAccountType::Unknown
            | WireAccountType::LegacyPrimary2022
            | WireAccountType::AssociatedTokenAccount => return None,
        };
        Some(account)
    }

    pub fn from_wire_value(value: i32, relationship: Option<&Domain>) -> Option<Self> {
        Self::from_wire(WireAccountType::from_i32(value)?, relationship)
    }
}

impl From<TrayAccount> for AccountType {
    fn from(account: TrayAccount) -> Self {
        AccountType::Tray(account)
    }
}

impl From<ExternalAccount> for AccountType {
    fn from(account: ExternalAccount) -> Self {
        AccountType::External(account)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Tray(account) => write!(f, "{}", account),
            AccountType::External(account) => write!(f, "{}", account),
        }
    }
}

/// Account type enum as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum WireAccountType {
    Unknown = 0,
    Primary = 1,
    TemporaryIncoming = 2,
    TemporaryOutgoing = 3,
    Bucket1Kin = 4,
    Bucket10Kin = 5,
    Bucket100Kin = 6,
    Bucket1000Kin = 7,
    Bucket10000Kin = 8,
    Bucket100000Kin = 9,
    Bucket1000000Kin = 10,
    LegacyPrimary2022 = 11,
    RemoteSendGiftCard = 12,
    Relationship = 13,
    Swap = 14,
    AssociatedTokenAccount = 15,
}

impl WireAccountType {
    pub fn from_i32(value: i32) -> Option<Self> {
        let wire = match value {
            0 => WireAccountType::Unknown,
            1 => WireAccountType::Primary,
            2 => WireAccountType::TemporaryIncoming,
            3 => WireAccountType::TemporaryOutgoing,
            4 => WireAccountType::Bucket1Kin,
            5 => WireAccountType::Bucket10Kin,
            6 => WireAccountType::Bucket100Kin,
            7 => WireAccountType::Bucket1000Kin,
            8 => WireAccountType::Bucket10000Kin,
            9 => WireAccountType::Bucket100000Kin,
            10 => WireAccountType::Bucket1000000Kin,
            11 => WireAccountType::LegacyPrimary2022,
            12 => WireAccountType::RemoteSendGiftCard,
            13 => WireAccountType::Relationship,
            14 => WireAccountType::Swap,
            15 => WireAccountType::AssociatedTokenAccount,
            _ => return None,
        };
        Some(wire)
    }

    pub fn value(&self) -> i32 {
        *self as i32
    }
}
