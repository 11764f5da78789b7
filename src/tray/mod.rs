//! Denomination tray and its exchange algorithms

pub mod exchange;
pub mod slot;
#[allow(clippy::module_inception)]
pub mod tray;

pub use exchange::{
    normalize, normalize_largest, DynamicStep, InternalExchange, MAX_BILLS_PER_EXCHANGE,
};
pub use slot::{PartialAccount, Slot};
pub use tray::Tray;
