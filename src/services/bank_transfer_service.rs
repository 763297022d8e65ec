use crate::error::{AppError, AppResult};
use crate::models::{BankTransferRequest, Payable};
use crate::repositories::{BankTransferRepository, WalletRepository};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Service for the bank transfer approval workflow: pending -> approved
/// (credits the wallet) or pending -> rejected.
pub struct BankTransferService {
    pool: PgPool,
    transfer_repo: Arc<BankTransferRepository>,
    wallet_repo: Arc<WalletRepository>,
}

impl BankTransferService {
    pub fn new(
        pool: PgPool,
        transfer_repo: Arc<BankTransferRepository>,
        wallet_repo: Arc<WalletRepository>,
    ) -> Self {
        Self {
            pool,
            transfer_repo,
            wallet_repo,
        }
    }

    /// Create a pending bank transfer request for an owner
    pub async fn request(&self, payable: &Payable) -> AppResult<BankTransferRequest> {
        let request = BankTransferRequest::new(payable);
        let created = self.transfer_repo.create(&request).await?;

        info!(
            request_id = %created.id,
            reference = %created.reference_number,
            owner = %payable,
            "bank transfer request created"
        );

        Ok(created)
    }

    /// Admin: approve the transfer, recording the bank details and
    /// crediting the verified amount to the requester's wallet in one
    /// database transaction
    pub async fn approve(
        &self,
        id: Uuid,
        admin_id: Uuid,
        bank_id: Uuid,
        transfer_reference: &str,
        amount: Decimal,
    ) -> AppResult<BankTransferRequest> {
        let result = self
            .approve_inner(id, admin_id, bank_id, transfer_reference, amount)
            .await;

        if let Err(ref e) = result {
            error!(request_id = %id, error = %e, "bank transfer approval failed, rolled back");
        }

        result
    }

    async fn approve_inner(
        &self,
        id: Uuid,
        admin_id: Uuid,
        bank_id: Uuid,
        transfer_reference: &str,
        amount: Decimal,
    ) -> AppResult<BankTransferRequest> {
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut request = self
            .transfer_repo
            .find_for_update_in_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bank transfer request {} not found", id)))?;

        let credited = request
            .approve(admin_id, bank_id, transfer_reference, amount, now)
            .map_err(AppError::BusinessLogic)?;

        let payable = request.payable().map_err(AppError::Validation)?;
        self.wallet_repo
            .deposit_in_tx(
                &mut tx,
                &payable,
                credited,
                json!({
                    "description": "Bank transfer approved",
                    "reference_number": request.reference_number,
                    "transfer_reference": transfer_reference,
                }),
            )
            .await?;

        let saved = self.transfer_repo.save_in_tx(&mut tx, &request).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(
            request_id = %id,
            admin_id = %admin_id,
            %amount,
            "bank transfer approved"
        );

        Ok(saved)
    }

    /// Admin: reject the transfer, storing the reason. Runs under the
    /// request row lock, like approval.
    pub async fn reject(
        &self,
        id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> AppResult<BankTransferRequest> {
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut request = self
            .transfer_repo
            .find_for_update_in_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Bank transfer request {} not found", id)))?;

        request
            .reject(admin_id, reason, now)
            .map_err(AppError::BusinessLogic)?;

        let saved = self.transfer_repo.save_in_tx(&mut tx, &request).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(request_id = %id, admin_id = %admin_id, "bank transfer rejected");

        Ok(saved)
    }
}
