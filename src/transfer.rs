//! Funds transfer boundary and an in-memory bank implementing it

use crate::errors::TransferError;
use crate::types::{Address, Wei};
use dashmap::{DashMap, DashSet};

/// Sends value to an address. Failure must reach the caller.
pub trait FundsTransfer: Send + Sync {
    fn transfer(&self, to: &Address, amount: Wei) -> Result<(), TransferError>;
}

/// Thread-safe balance book
#[derive(Default)]
pub struct InMemoryBank {
    balances: DashMap<Address, Wei>,
    rejecting: DashSet<Address>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credit(&self, address: Address, amount: Wei) -> Result<Wei, TransferError> {
        let mut balance = self.balances.entry(address).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow(address))?;
        Ok(*balance)
    }

    pub fn balance_of(&self, address: &Address) -> Wei {
        self.balances.get(address).map(|b| *b).unwrap_or(0)
    }

    /// Make `address` refuse incoming transfers
    pub fn reject_payments_to(&self, address: Address) {
        self.rejecting.insert(address);
    }

    pub fn accept_payments_to(&self, address: &Address) {
        self.rejecting.remove(address);
    }
}

impl FundsTransfer for InMemoryBank {
    fn transfer(&self, to: &Address, amount: Wei) -> Result<(), TransferError> {
        if self.rejecting.contains(to) {
            tracing::warn!(recipient = %to, amount, "Transfer rejected by recipient");
            return Err(TransferError::Rejected(*to));
        }
        self.credit(*to, amount)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_credits_recipient() {
        let bank = InMemoryBank::new();
        let alice = Address::repeat_byte(1);

        bank.transfer(&alice, 5).unwrap();
        bank.transfer(&alice, 7).unwrap();
        assert_eq!(bank.balance_of(&alice), 12);
        assert_eq!(bank.balance_of(&Address::repeat_byte(2)), 0);
    }

    #[test]
    fn test_rejecting_recipient() {
        let bank = InMemoryBank::new();
        let bob = Address::repeat_byte(2);
        bank.reject_payments_to(bob);

        assert_eq!(bank.transfer(&bob, 1), Err(TransferError::Rejected(bob)));
        assert_eq!(bank.balance_of(&bob), 0);

        bank.accept_payments_to(&bob);
        bank.transfer(&bob, 1).unwrap();
        assert_eq!(bank.balance_of(&bob), 1);
    }

    #[test]
    fn test_credit_overflow() {
        let bank = InMemoryBank::new();
        let carol = Address::repeat_byte(3);
        bank.credit(carol, Wei::MAX).unwrap();
        assert_eq!(bank.credit(carol, 1), Err(TransferError::Overflow(carol)));
        assert_eq!(bank.balance_of(&carol), Wei::MAX);
    }
}
