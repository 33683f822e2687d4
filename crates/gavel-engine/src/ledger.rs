//! Per-team budget and acquisition ledger.
//!
//! The ledger is the only authority over a team's purse and acquired players.
//! `acquire` is the single path that mutates both, all-or-nothing: either the
//! purse is debited and the player appended, or nothing changes.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors from ledger mutations. No variant leaves the ledger changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Insufficient purse: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Player {player_id} is not in this ledger")]
    NotOwned { player_id: String },

    #[error("Amount must not be negative: {amount}")]
    NegativeAmount { amount: Decimal },
}

impl LedgerError {
    /// Machine-readable code for wire errors.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::NotOwned { .. } => "NOT_OWNED",
            LedgerError::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
        }
    }
}

/// One acquired player and the price paid.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Acquisition {
    pub player_id: String,
    pub price: Decimal,
}

/// A team's purse and acquired players, in acquisition order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    initial_purse: Decimal,
    purse_remaining: Decimal,
    acquisitions: Vec<Acquisition>,
}

impl Ledger {
    /// Creates a ledger with the full purse and no acquisitions.
    pub fn new(initial_purse: Decimal) -> Self {
        Self {
            initial_purse,
            purse_remaining: initial_purse,
            acquisitions: Vec::new(),
        }
    }

    pub fn initial_purse(&self) -> Decimal {
        self.initial_purse
    }

    pub fn purse_remaining(&self) -> Decimal {
        self.purse_remaining
    }

    /// Acquired players in acquisition order.
    pub fn acquisitions(&self) -> &[Acquisition] {
        &self.acquisitions
    }

    pub fn squad_size(&self) -> usize {
        self.acquisitions.len()
    }

    pub fn owns(&self, player_id: &str) -> bool {
        self.acquisitions.iter().any(|a| a.player_id == player_id)
    }

    /// Total spent so far. Always equals `initial_purse - purse_remaining`.
    pub fn total_spent(&self) -> Decimal {
        self.acquisitions.iter().map(|a| a.price).sum()
    }

    /// Checks whether a price is affordable without mutating anything.
    pub fn can_afford(&self, price: Decimal) -> bool {
        price <= self.purse_remaining
    }

    /// Debits the purse without attaching a player.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { amount });
        }
        if amount > self.purse_remaining {
            return Err(LedgerError::InsufficientFunds {
                requested: amount,
                available: self.purse_remaining,
            });
        }
        self.purse_remaining -= amount;
        Ok(())
    }

    /// Atomically debits the purse and appends the player.
    ///
    /// On error nothing has changed; the caller must treat
    /// `InsufficientFunds` as terminal for this sale attempt.
    pub fn acquire(&mut self, player_id: &str, price: Decimal) -> Result<(), LedgerError> {
        if price < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { amount: price });
        }
        if price > self.purse_remaining {
            return Err(LedgerError::InsufficientFunds {
                requested: price,
                available: self.purse_remaining,
            });
        }
        self.purse_remaining -= price;
        self.acquisitions.push(Acquisition {
            player_id: player_id.to_string(),
            price,
        });
        Ok(())
    }

    /// Reversal path: removes the player and credits the price paid back.
    ///
    /// Returns the refunded amount.
    pub fn credit_on_reversal(&mut self, player_id: &str) -> Result<Decimal, LedgerError> {
        let pos = self
            .acquisitions
            .iter()
            .position(|a| a.player_id == player_id)
            .ok_or_else(|| LedgerError::NotOwned {
                player_id: player_id.to_string(),
            })?;
        let acquisition = self.acquisitions.remove(pos);
        self.purse_remaining += acquisition.price;
        Ok(acquisition.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger() -> Ledger {
        Ledger::new(dec!(100))
    }

    #[test]
    fn test_new_ledger() {
        let l = ledger();
        assert_eq!(l.purse_remaining(), dec!(100));
        assert_eq!(l.initial_purse(), dec!(100));
        assert!(l.acquisitions().is_empty());
        assert_eq!(l.total_spent(), dec!(0));
    }

    #[test]
    fn test_acquire_debits_and_appends() {
        let mut l = ledger();
        l.acquire("p1", dec!(7)).unwrap();
        assert_eq!(l.purse_remaining(), dec!(93));
        assert_eq!(l.acquisitions().len(), 1);
        assert!(l.owns("p1"));
        assert_eq!(l.total_spent(), dec!(7));
    }

    #[test]
    fn test_acquire_insufficient_funds_is_all_or_nothing() {
        let mut l = Ledger::new(dec!(5));
        let err = l.acquire("p1", dec!(10)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                requested: dec!(10),
                available: dec!(5),
            }
        );
        // Nothing mutated.
        assert_eq!(l.purse_remaining(), dec!(5));
        assert!(l.acquisitions().is_empty());
    }

    #[test]
    fn test_acquire_exact_purse() {
        let mut l = Ledger::new(dec!(10));
        l.acquire("p1", dec!(10)).unwrap();
        assert_eq!(l.purse_remaining(), dec!(0));
    }

    #[test]
    fn test_acquisition_order_preserved() {
        let mut l = ledger();
        l.acquire("p1", dec!(5)).unwrap();
        l.acquire("p2", dec!(10)).unwrap();
        l.acquire("p3", dec!(2)).unwrap();
        let ids: Vec<&str> = l.acquisitions().iter().map(|a| a.player_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_budget_invariant_over_sequence() {
        let mut l = ledger();
        l.acquire("p1", dec!(12.5)).unwrap();
        l.acquire("p2", dec!(30)).unwrap();
        l.credit_on_reversal("p1").unwrap();
        l.acquire("p3", dec!(1.25)).unwrap();
        assert_eq!(
            l.purse_remaining(),
            l.initial_purse() - l.total_spent()
        );
    }

    #[test]
    fn test_credit_on_reversal() {
        let mut l = ledger();
        l.acquire("p1", dec!(40)).unwrap();
        let refund = l.credit_on_reversal("p1").unwrap();
        assert_eq!(refund, dec!(40));
        assert_eq!(l.purse_remaining(), dec!(100));
        assert!(!l.owns("p1"));
    }

    #[test]
    fn test_credit_on_reversal_not_owned() {
        let mut l = ledger();
        let err = l.credit_on_reversal("ghost").unwrap_err();
        assert!(matches!(err, LedgerError::NotOwned { .. }));
        assert_eq!(err.code(), "NOT_OWNED");
    }

    #[test]
    fn test_debit_rejects_negative() {
        let mut l = ledger();
        assert!(matches!(
            l.debit(dec!(-1)),
            Err(LedgerError::NegativeAmount { .. })
        ));
        assert_eq!(l.purse_remaining(), dec!(100));
    }

    #[test]
    fn test_can_afford() {
        let l = Ledger::new(dec!(5));
        assert!(l.can_afford(dec!(5)));
        assert!(!l.can_afford(dec!(5.01)));
    }
}
