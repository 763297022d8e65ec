use crate::error::{AppError, AppResult};
use crate::models::{Payable, WithdrawalRequest};
use crate::repositories::{WalletRepository, WithdrawalRepository};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Service for the withdrawal approval workflow:
/// pending -> processing -> completed, with refund-on-reject.
pub struct WithdrawalService {
    pool: PgPool,
    withdrawal_repo: Arc<WithdrawalRepository>,
    wallet_repo: Arc<WalletRepository>,
}

impl WithdrawalService {
    pub fn new(
        pool: PgPool,
        withdrawal_repo: Arc<WithdrawalRepository>,
        wallet_repo: Arc<WalletRepository>,
    ) -> Self {
        Self {
            pool,
            withdrawal_repo,
            wallet_repo,
        }
    }

    /// Create a withdrawal request, deducting the funds from the wallet
    /// up front. The deduction and the request row commit together.
    pub async fn request(&self, payable: &Payable, amount: Decimal) -> AppResult<WithdrawalRequest> {
        if amount <= Decimal::ZERO {
            return Err(AppError::Validation("Amount must be positive".into()));
        }

        let request = WithdrawalRequest::new(payable, amount, true);

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        self.wallet_repo
            .withdraw_in_tx(
                &mut tx,
                payable,
                amount,
                json!({
                    "description": "Withdrawal request",
                    "reference_number": request.reference_number,
                }),
            )
            .await?;

        let created = self.withdrawal_repo.create_in_tx(&mut tx, &request).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(
            request_id = %created.id,
            reference = %created.reference_number,
            owner = %payable,
            %amount,
            "withdrawal request created"
        );

        Ok(created)
    }

    /// Admin: pending -> processing. Runs under the request row lock,
    /// like every status transition on this aggregate.
    pub async fn begin_processing(&self, id: Uuid, admin_id: Uuid) -> AppResult<WithdrawalRequest> {
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut request = self
            .withdrawal_repo
            .find_for_update_in_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal request {} not found", id)))?;

        request
            .begin_processing(admin_id, now)
            .map_err(AppError::BusinessLogic)?;

        let saved = self.withdrawal_repo.save_in_tx(&mut tx, &request).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(request_id = %id, admin_id = %admin_id, "withdrawal request processing");

        Ok(saved)
    }

    /// Admin: processing -> completed
    pub async fn complete(&self, id: Uuid, admin_id: Uuid) -> AppResult<WithdrawalRequest> {
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut request = self
            .withdrawal_repo
            .find_for_update_in_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal request {} not found", id)))?;

        request
            .complete(admin_id, now)
            .map_err(AppError::BusinessLogic)?;

        let saved = self.withdrawal_repo.save_in_tx(&mut tx, &request).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(request_id = %id, admin_id = %admin_id, "withdrawal request completed");

        Ok(saved)
    }

    /// Admin: reject the request. When the funds were deducted at
    /// creation, exactly one compensating deposit is written and the
    /// `money_withdrawn` flag flips, all in one database transaction.
    pub async fn reject(
        &self,
        id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> AppResult<WithdrawalRequest> {
        let result = self.reject_inner(id, admin_id, reason).await;

        if let Err(ref e) = result {
            error!(request_id = %id, error = %e, "withdrawal rejection failed, rolled back");
        }

        result
    }

    async fn reject_inner(
        &self,
        id: Uuid,
        admin_id: Uuid,
        reason: &str,
    ) -> AppResult<WithdrawalRequest> {
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut request = self
            .withdrawal_repo
            .find_for_update_in_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal request {} not found", id)))?;

        let refund = request
            .reject(admin_id, reason, now)
            .map_err(AppError::BusinessLogic)?;

        if let Some(amount) = refund {
            let payable = request.payable().map_err(AppError::Validation)?;
            self.wallet_repo
                .deposit_in_tx(
                    &mut tx,
                    &payable,
                    amount,
                    json!({
                        "description": "Refund for rejected withdrawal request",
                        "reference_number": request.reference_number,
                    }),
                )
                .await?;
        }

        let saved = self.withdrawal_repo.save_in_tx(&mut tx, &request).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(
            request_id = %id,
            admin_id = %admin_id,
            refunded = refund.is_some(),
            "withdrawal request rejected"
        );

        Ok(saved)
    }

    /// Requester: cancel a still-pending request, with the same refund
    /// semantics as rejection
    pub async fn cancel(&self, id: Uuid) -> AppResult<WithdrawalRequest> {
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut request = self
            .withdrawal_repo
            .find_for_update_in_tx(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Withdrawal request {} not found", id)))?;

        let refund = request.cancel(now).map_err(AppError::BusinessLogic)?;

        if let Some(amount) = refund {
            let payable = request.payable().map_err(AppError::Validation)?;
            self.wallet_repo
                .deposit_in_tx(
                    &mut tx,
                    &payable,
                    amount,
                    json!({
                        "description": "Refund for cancelled withdrawal request",
                        "reference_number": request.reference_number,
                    }),
                )
                .await?;
        }

        let saved = self.withdrawal_repo.save_in_tx(&mut tx, &request).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(request_id = %id, refunded = refund.is_some(), "withdrawal request cancelled");

        Ok(saved)
    }
}
