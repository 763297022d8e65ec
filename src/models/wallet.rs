//! Wallet and ledger transaction models.
//!
//! The ledger is append-only: a wallet's balance is never stored, it is
//! the fold of its confirmed transactions at read time.

use crate::models::Payable;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Wallet row anchoring an owner's ledger.
///
/// Carries no balance column; it exists so per-owner mutations have a
/// single row to lock (`SELECT ... FOR UPDATE`).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub payable_type: String,
    pub payable_id: Uuid,
    pub created_at: NaiveDateTime,
}

impl Wallet {
    pub fn owner(&self) -> Result<Payable, String> {
        Payable::from_parts(&self.payable_type, self.payable_id)
    }
}

/// Ledger entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdraw,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "deposit" => Some(Self::Deposit),
            "withdraw" => Some(Self::Withdraw),
            _ => None,
        }
    }
}

/// Immutable ledger record. Never updated after insert.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub payable_type: String,
    pub payable_id: Uuid,
    pub tx_type: String,
    pub amount: Decimal,
    pub confirmed: bool,
    pub meta: Value,
    pub created_at: NaiveDateTime,
}

impl WalletTransaction {
    pub fn tx_type(&self) -> Option<TransactionType> {
        TransactionType::from_str(&self.tx_type)
    }

    /// Signed contribution of this entry to the owner's balance
    pub fn signed_amount(&self) -> Decimal {
        match self.tx_type() {
            Some(TransactionType::Deposit) => self.amount,
            Some(TransactionType::Withdraw) => -self.amount,
            None => Decimal::ZERO,
        }
    }
}

/// Fold a transaction history into a balance: confirmed deposits minus
/// confirmed withdrawals. The SQL aggregate in the wallet repository
/// computes exactly this.
pub fn balance_of(transactions: &[WalletTransaction]) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.confirmed)
        .map(|tx| tx.signed_amount())
        .sum()
}
