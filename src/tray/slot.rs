//! Denomination slots and partial accounts

use crate::accounts::{AccountCluster, SlotType};

/// One fixed-denomination bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub slot_type: SlotType,
    pub cluster: AccountCluster,
    pub partial_balance: u64,
}

impl Slot {
    pub fn new(slot_type: SlotType, cluster: AccountCluster) -> Self {
        Self {
            slot_type,
            cluster,
            partial_balance: 0,
        }
    }

    pub fn bill_value(&self) -> u64 {
        self.slot_type.bill_value()
    }

    /// Whole bills held. Any remainder is not a bill.
    pub fn bill_count(&self) -> u64 {
        self.partial_balance / self.bill_value()
    }

    /// Balance below one bill
    pub fn remainder(&self) -> u64 {
        self.partial_balance % self.bill_value()
    }
}

/// Primary, incoming or outgoing account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialAccount {
    pub cluster: AccountCluster,
    pub partial_balance: u64,
}

impl PartialAccount {
    pub fn new(cluster: AccountCluster) -> Self {
        Self {
            cluster,
            partial_balance: 0,
        }
    }
}
