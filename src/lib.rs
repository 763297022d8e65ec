//! Tharwa Backend Library
//!
//! Core of the Tharwa investment platform: the wallet ledger, the
//! investment lifecycle, and the admin approval workflows, exposed for
//! the API layer and for tests.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult};

use database::Database;
use repositories::*;
use services::*;
use std::sync::Arc;

/// Application state containing all repositories and services
pub struct AppState {
    pub database: Database,
    pub wallet_repo: Arc<WalletRepository>,
    pub opportunity_repo: Arc<OpportunityRepository>,
    pub investment_repo: Arc<InvestmentRepository>,
    pub withdrawal_repo: Arc<WithdrawalRepository>,
    pub bank_transfer_repo: Arc<BankTransferRepository>,
    pub wallet_service: Arc<WalletService>,
    pub investment_service: Arc<InvestmentService>,
    pub withdrawal_service: Arc<WithdrawalService>,
    pub bank_transfer_service: Arc<BankTransferService>,
}

impl AppState {
    /// Create a new AppState with initialized repositories and services
    pub fn new(pool: sqlx::PgPool) -> Self {
        let database = Database::new(pool.clone());

        let wallet_repo = Arc::new(WalletRepository::new(pool.clone()));
        let opportunity_repo = Arc::new(OpportunityRepository::new(pool.clone()));
        let investment_repo = Arc::new(InvestmentRepository::new(pool.clone()));
        let withdrawal_repo = Arc::new(WithdrawalRepository::new(pool.clone()));
        let bank_transfer_repo = Arc::new(BankTransferRepository::new(pool.clone()));

        let wallet_service = Arc::new(WalletService::new(Arc::clone(&wallet_repo)));
        let investment_service = Arc::new(InvestmentService::new(
            pool.clone(),
            Arc::clone(&opportunity_repo),
            Arc::clone(&investment_repo),
            Arc::clone(&wallet_repo),
        ));
        let withdrawal_service = Arc::new(WithdrawalService::new(
            pool.clone(),
            Arc::clone(&withdrawal_repo),
            Arc::clone(&wallet_repo),
        ));
        let bank_transfer_service = Arc::new(BankTransferService::new(
            pool,
            Arc::clone(&bank_transfer_repo),
            Arc::clone(&wallet_repo),
        ));

        Self {
            database,
            wallet_repo,
            opportunity_repo,
            investment_repo,
            withdrawal_repo,
            bank_transfer_repo,
            wallet_service,
            investment_service,
            withdrawal_service,
            bank_transfer_service,
        }
    }
}
