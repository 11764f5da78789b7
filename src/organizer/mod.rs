//! Reconciles ledger-reported accounts into the tray

pub mod account_info;
#[allow(clippy::module_inception)]
pub mod organizer;

pub use account_info::{AccountInfo, BalanceSource, BlockchainState, ClaimState, ManagementState};
pub use organizer::{Organizer, ReconcileReport};
