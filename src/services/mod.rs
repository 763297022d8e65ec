pub mod bank_transfer_service;
pub mod investment_service;
pub mod wallet_service;
pub mod withdrawal_service;

pub use bank_transfer_service::BankTransferService;
pub use investment_service::InvestmentService;
pub use wallet_service::WalletService;
pub use withdrawal_service::WithdrawalService;
