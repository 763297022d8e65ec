//! Data access layer: one repository per aggregate, multi-row mutations
//! behind explicit database transactions.

pub mod bank_transfer_repository;
pub mod investment_repository;
pub mod opportunity_repository;
pub mod wallet_repository;
pub mod withdrawal_repository;

pub use bank_transfer_repository::BankTransferRepository;
pub use investment_repository::InvestmentRepository;
pub use opportunity_repository::OpportunityRepository;
pub use wallet_repository::WalletRepository;
pub use withdrawal_repository::WithdrawalRepository;
