//! Entry ledger: paid participants of the current round and the pooled balance

use crate::errors::{LotteryError, LotteryResult};
use crate::types::{Address, Wei};

/// Entrants in entry order (duplicates allowed) plus the pool they funded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryLedger {
    entrants: Vec<Address>,
    pool_balance: Wei,
}

impl EntryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entrant and credit the pool. Does nothing on overflow.
    pub fn record(&mut self, entrant: Address, amount: Wei) -> LotteryResult<()> {
        let pool_balance = self
            .pool_balance
            .checked_add(amount)
            .ok_or(LotteryError::BalanceOverflow)?;
        self.pool_balance = pool_balance;
        self.entrants.push(entrant);
        Ok(())
    }

    pub fn player_at(&self, index: usize) -> LotteryResult<Address> {
        self.entrants
            .get(index)
            .copied()
            .ok_or(LotteryError::IndexOutOfRange {
                index,
                len: self.entrants.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.entrants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entrants.is_empty()
    }

    pub fn entrants(&self) -> &[Address] {
        &self.entrants
    }

    pub fn pool_balance(&self) -> Wei {
        self.pool_balance
    }

    /// Empty the ledger for the next round
    pub fn clear(&mut self) {
        self.entrants.clear();
        self.pool_balance = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_entry_order_and_duplicates() {
        let mut ledger = EntryLedger::new();
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);

        ledger.record(a, 10).unwrap();
        ledger.record(b, 11).unwrap();
        ledger.record(a, 10).unwrap();

        assert_eq!(ledger.entrants(), &[a, b, a]);
        assert_eq!(ledger.pool_balance(), 31);
        assert_eq!(ledger.player_at(2).unwrap(), a);
    }

    #[test]
    fn test_player_at_out_of_range() {
        let mut ledger = EntryLedger::new();
        ledger.record(Address::repeat_byte(1), 1).unwrap();

        match ledger.player_at(1) {
            Err(LotteryError::IndexOutOfRange { index: 1, len: 1 }) => {}
            other => panic!("Expected IndexOutOfRange, got {:?}", other),
        }

        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(ledger.pool_balance(), 0);
        assert!(ledger.player_at(0).is_err());
    }

    #[test]
    fn test_overflow_leaves_ledger_untouched() {
        let mut ledger = EntryLedger::new();
        ledger.record(Address::repeat_byte(1), Wei::MAX).unwrap();

        let err = ledger.record(Address::repeat_byte(2), 1).unwrap_err();
        assert!(matches!(err, LotteryError::BalanceOverflow));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pool_balance(), Wei::MAX);
    }
}
