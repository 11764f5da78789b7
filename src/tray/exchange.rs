//! Internal value movements and chunking helpers

use serde::{Deserialize, Serialize};

use crate::accounts::{SlotType, TrayAccount};

/// Bills of one denomination moved by a single exchange
pub const MAX_BILLS_PER_EXCHANGE: u64 = 9;

/// A value movement between two tray accounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InternalExchange {
    pub from: TrayAccount,
    pub to: Option<TrayAccount>,
    pub amount: u64,
}

impl InternalExchange {
    pub fn new(from: TrayAccount, to: TrayAccount, amount: u64) -> Self {
        Self {
            from,
            to: Some(to),
            amount,
        }
    }
}

/// Result of the first pass of a dynamic withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicStep {
    pub remaining: u64,
    /// Slot whose bill gets broken down in the second pass
    pub index: usize,
    pub exchanges: Vec<InternalExchange>,
}

/// Split `amount` into moves of at most `max_bills` bills of `slot_type`.
/// Anything below one bill is dropped.
pub fn normalize(slot_type: SlotType, amount: u64, max_bills: u64) -> Vec<u64> {
    let bill_value = slot_type.bill_value();
    let mut chunks = Vec::new();
    let mut how_many_fit = amount / bill_value;
    while how_many_fit > 0 {
        let bills = how_many_fit.min(max_bills);
        chunks.push(bills * bill_value);
        how_many_fit -= bills;
    }
    chunks
}

/// Split `amount` into moves using the largest denominations first, at most
/// `max_bills` bills per move
pub fn normalize_largest(amount: u64, max_bills: u64) -> Vec<u64> {
    let mut chunks = Vec::new();
    let mut remaining = amount;
    for slot_type in SlotType::ALL.iter().rev() {
        let bill_value = slot_type.bill_value();
        let mut how_many_fit = remaining / bill_value;
        while how_many_fit > 0 {
            let bills = how_many_fit.min(max_bills);
            let chunk = bills * bill_value;
            chunks.push(chunk);
            remaining -= chunk;
            how_many_fit -= bills;
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let max = MAX_BILLS_PER_EXCHANGE;
        assert_eq!(normalize(SlotType::Bucket1k, 5_000, max), vec![5_000]);
        assert_eq!(normalize(SlotType::Bucket1k, 500, max), Vec::<u64>::new());
        assert_eq!(normalize(SlotType::Bucket1k, 0, max), Vec::<u64>::new());
        assert_eq!(normalize(SlotType::Bucket100, 1_200, max), vec![900, 300]);
        assert_eq!(normalize(SlotType::Bucket100, 1_050, max), vec![900, 100]);
        assert_eq!(normalize(SlotType::Bucket1, 20, max), vec![9, 9, 2]);
    }

    #[test]
    fn test_normalize_smaller_chunks() {
        assert_eq!(normalize(SlotType::Bucket10, 100, 4), vec![40, 40, 20]);
    }

    #[test]
    fn test_normalize_largest() {
        let max = MAX_BILLS_PER_EXCHANGE;
        assert_eq!(
            normalize_largest(1_489_725, max),
            vec![1_000_000, 400_000, 80_000, 9_000, 700, 20, 5]
        );
        assert_eq!(
            normalize_largest(10_893_257, max),
            vec![9_000_000, 1_000_000, 800_000, 90_000, 3_000, 200, 50, 7]
        );
        assert_eq!(normalize_largest(500_000, max), vec![500_000]);
        assert_eq!(
            normalize_largest(950_204, max),
            vec![900_000, 50_000, 200, 4]
        );
        assert_eq!(normalize_largest(30_852, max), vec![30_000, 800, 50, 2]);
    }

    #[test]
    fn test_chunks_never_exceed_nine_bills() {
        for amount in [1u64, 9, 10, 99, 12_345, 9_999_999, 123_456_789] {
            for chunk in normalize_largest(amount, MAX_BILLS_PER_EXCHANGE) {
                let denomination = SlotType::ALL
                    .iter()
                    .rev()
                    .map(|s| s.bill_value())
                    .find(|v| chunk % v == 0 && chunk / v <= MAX_BILLS_PER_EXCHANGE);
                assert!(denomination.is_some(), "{} in {}", chunk, amount);
            }
            assert_eq!(
                normalize_largest(amount, MAX_BILLS_PER_EXCHANGE).iter().sum::<u64>(),
                amount
            );
        }
    }

    #[test]
    fn test_exchange_serde() {
        let exchange = InternalExchange::new(
            TrayAccount::Bucket(SlotType::Bucket10),
            TrayAccount::Outgoing,
            90,
        );
        let json = serde_json::to_string(&exchange).unwrap();
        assert_eq!(json, r#"{"from":{"bucket":"bucket10"},"to":"outgoing","amount":90}"#);
    }
}
