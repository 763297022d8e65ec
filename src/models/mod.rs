//! Domain models for the Tharwa backend.
//!
//! Data structs map 1:1 to database rows; status enums round-trip
//! through their string columns; all transition guards and monetary
//! arithmetic live here as pure methods so the invariants are testable
//! without a database.

pub mod bank_transfer;
pub mod investment;
pub mod opportunity;
pub mod payable;
pub mod wallet;
pub mod withdrawal;
pub mod workflow;

// Re-export all models for convenient access
pub use bank_transfer::{BankTransferRequest, BankTransferStatus, BANK_TRANSFER_TRANSITIONS};
pub use investment::{
    DistributionStatus, Investment, InvestmentStatus, InvestmentType, MerchandiseStatus,
    INVESTMENT_TRANSITIONS,
};
pub use opportunity::{InvestmentOpportunity, OpportunityStatus};
pub use payable::Payable;
pub use wallet::{balance_of, TransactionType, Wallet, WalletTransaction};
pub use withdrawal::{WithdrawalRequest, WithdrawalStatus, WITHDRAWAL_TRANSITIONS};
pub use workflow::{TransitionTable, WorkflowStatus};
