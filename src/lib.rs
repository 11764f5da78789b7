//! Tray wallet core
//!
//! Denomination-based balance engine and key derivation for a non-custodial
//! Solana wallet. Funds are split across fixed-denomination slot accounts
//! so payments can be assembled from whole bills.

pub mod accounts;
pub mod cli;
pub mod config;
pub mod error;
pub mod keys;
pub mod merkle;
pub mod organizer;
pub mod tray;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use organizer::Organizer;
pub use tray::Tray;
