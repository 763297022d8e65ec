use crate::error::{AppError, AppResult};
use crate::models::{Payable, WalletTransaction};
use crate::repositories::WalletRepository;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Service for wallet balance reads and direct ledger movements
pub struct WalletService {
    wallet_repo: Arc<WalletRepository>,
}

impl WalletService {
    pub fn new(wallet_repo: Arc<WalletRepository>) -> Self {
        Self { wallet_repo }
    }

    /// Current balance for an owner
    pub async fn balance(&self, payable: &Payable) -> AppResult<Decimal> {
        Ok(self.wallet_repo.balance(payable).await?)
    }

    /// Credit an owner's wallet
    pub async fn deposit(
        &self,
        payable: &Payable,
        amount: Decimal,
        description: &str,
    ) -> AppResult<WalletTransaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("Amount must be positive".into()));
        }

        let record = self
            .wallet_repo
            .deposit(payable, amount, json!({ "description": description }))
            .await?;

        info!(owner = %payable, %amount, "wallet deposit recorded");

        Ok(record)
    }

    /// Debit an owner's wallet, failing on insufficient balance
    pub async fn withdraw(
        &self,
        payable: &Payable,
        amount: Decimal,
        description: &str,
    ) -> AppResult<WalletTransaction> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("Amount must be positive".into()));
        }

        let record = self
            .wallet_repo
            .withdraw(payable, amount, json!({ "description": description }))
            .await?;

        info!(owner = %payable, %amount, "wallet withdrawal recorded");

        Ok(record)
    }

    /// Transaction history for an owner, newest first
    pub async fn transactions(
        &self,
        payable: &Payable,
        limit: i64,
    ) -> AppResult<Vec<WalletTransaction>> {
        Ok(self.wallet_repo.transactions_for(payable, limit).await?)
    }
}
