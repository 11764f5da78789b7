//! Account roles, clusters and relationships

pub mod account_type;
pub mod cluster;
pub mod domain;
pub mod relationship;
pub mod timelock;

pub use account_type::{
    AccountType, DepositAccount, ExternalAccount, IndexedAccount, SlotType, TrayAccount, WireAccountType,
};
pub use cluster::{AccountCluster, ProgramDerivedAccount, TimelockDerivedAccounts};
pub use domain::Domain;
pub use relationship::{Relationship, RelationshipBox};
pub use timelock::TimelockParams;
