use crate::error::{AppError, AppResult};
use crate::models::{
    Investment, InvestmentStatus, InvestmentType, OpportunityStatus, Payable,
};
use crate::repositories::{InvestmentRepository, OpportunityRepository, WalletRepository};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Service for share purchases and the investment lifecycle
pub struct InvestmentService {
    pool: PgPool,
    opportunity_repo: Arc<OpportunityRepository>,
    investment_repo: Arc<InvestmentRepository>,
    wallet_repo: Arc<WalletRepository>,
}

impl InvestmentService {
    pub fn new(
        pool: PgPool,
        opportunity_repo: Arc<OpportunityRepository>,
        investment_repo: Arc<InvestmentRepository>,
        wallet_repo: Arc<WalletRepository>,
    ) -> Self {
        Self {
            pool,
            opportunity_repo,
            investment_repo,
            wallet_repo,
        }
    }

    /// Purchase shares in an opportunity.
    ///
    /// One database transaction covers the guarded share reservation,
    /// the wallet charge for the added shares, and the investment row.
    /// A repeat purchase by the same investor merges into the existing
    /// row instead of creating a second one.
    pub async fn invest(
        &self,
        opportunity_id: Uuid,
        investor_id: Uuid,
        shares: i64,
        investment_type: InvestmentType,
        expected_profit_per_share: Decimal,
    ) -> AppResult<Investment> {
        if shares <= 0 {
            return Err(AppError::Validation(
                "Share count must be greater than zero".into(),
            ));
        }

        let payable = Payable::InvestorProfile(investor_id);
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        // Guarded compare-and-increment; fails cleanly when the cap
        // would be exceeded
        let opportunity = self
            .opportunity_repo
            .reserve_shares_in_tx(&mut tx, opportunity_id, shares)
            .await?;

        if !matches!(
            opportunity.status_enum(),
            OpportunityStatus::Open | OpportunityStatus::Active
        ) {
            return Err(AppError::BusinessLogic(
                "Opportunity is not open for investment".into(),
            ));
        }

        let existing = self
            .investment_repo
            .find_position_for_update_in_tx(&mut tx, opportunity_id, investor_id)
            .await?;

        // The charge covers the added shares only; a merge keeps the
        // price frozen on the position, so charge at that same price
        let share_price = existing
            .as_ref()
            .map(|position| position.share_price)
            .unwrap_or(opportunity.share_price);
        let mut payment = share_price * Decimal::from(shares);
        if investment_type == InvestmentType::Myself {
            payment += opportunity.shipping_fee_per_share * Decimal::from(shares);
        }

        self.wallet_repo
            .withdraw_in_tx(
                &mut tx,
                &payable,
                payment,
                json!({
                    "description": format!("Investment in {}", opportunity.title),
                    "opportunity_id": opportunity.id,
                }),
            )
            .await?;

        let investment = match existing {
            Some(mut position) => {
                if position.investment_type_enum() != investment_type {
                    return Err(AppError::BusinessLogic(
                        "Investment type mismatch with existing position".into(),
                    ));
                }
                position
                    .merge_purchase(shares, opportunity.shipping_fee_per_share, now)
                    .map_err(AppError::BusinessLogic)?;
                self.investment_repo.save_in_tx(&mut tx, &position).await?
            }
            None => {
                let position = Investment::new(
                    &opportunity,
                    investor_id,
                    shares,
                    investment_type,
                    expected_profit_per_share,
                );
                self.investment_repo.insert_in_tx(&mut tx, &position).await?
            }
        };

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(
            investment_id = %investment.id,
            opportunity_id = %opportunity_id,
            investor_id = %investor_id,
            shares,
            %payment,
            "investment recorded"
        );

        Ok(investment)
    }

    /// Record merchandise delivery for a myself-type investment
    pub async fn mark_merchandise_arrived(&self, investment_id: Uuid) -> AppResult<Investment> {
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut investment = self
            .investment_repo
            .find_for_update_in_tx(&mut tx, investment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Investment {} not found", investment_id)))?;

        investment
            .mark_merchandise_arrived(now)
            .map_err(AppError::BusinessLogic)?;

        let saved = self.investment_repo.save_in_tx(&mut tx, &investment).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(investment_id = %investment_id, "merchandise marked arrived");

        Ok(saved)
    }

    /// Record realized returns for an authorize-type investment ahead of
    /// distribution
    pub async fn record_actual_returns(
        &self,
        investment_id: Uuid,
        net_profit_per_share: Decimal,
    ) -> AppResult<Investment> {
        if net_profit_per_share < Decimal::ZERO {
            return Err(AppError::Validation(
                "Net profit per share cannot be negative".into(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut investment = self
            .investment_repo
            .find_for_update_in_tx(&mut tx, investment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Investment {} not found", investment_id)))?;

        investment
            .record_actual_returns(net_profit_per_share, now)
            .map_err(AppError::BusinessLogic)?;

        let saved = self.investment_repo.save_in_tx(&mut tx, &investment).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(investment_id = %investment_id, %net_profit_per_share, "actual returns recorded");

        Ok(saved)
    }

    /// Distribute the realized profit of an authorize-type investment
    /// and credit it to the investor's wallet, atomically
    pub async fn distribute_profit(&self, investment_id: Uuid) -> AppResult<Investment> {
        let result = self.distribute_profit_inner(investment_id).await;

        if let Err(ref e) = result {
            error!(investment_id = %investment_id, error = %e, "profit distribution failed, rolled back");
        }

        result
    }

    async fn distribute_profit_inner(&self, investment_id: Uuid) -> AppResult<Investment> {
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut investment = self
            .investment_repo
            .find_for_update_in_tx(&mut tx, investment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Investment {} not found", investment_id)))?;

        let amount = investment
            .distribute_profit(now)
            .map_err(AppError::BusinessLogic)?;

        let saved = self.investment_repo.save_in_tx(&mut tx, &investment).await?;

        self.wallet_repo
            .deposit_in_tx(
                &mut tx,
                &Payable::InvestorProfile(investment.investor_id),
                amount,
                json!({
                    "description": "Profit distribution",
                    "investment_id": investment.id,
                    "opportunity_id": investment.opportunity_id,
                }),
            )
            .await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(
            investment_id = %investment_id,
            distributed_profit = %amount,
            "profit distributed"
        );

        Ok(saved)
    }

    /// Admin: pending -> active
    pub async fn activate(&self, investment_id: Uuid) -> AppResult<Investment> {
        self.update_status(investment_id, InvestmentStatus::Active).await
    }

    /// Admin: active -> completed
    pub async fn complete(&self, investment_id: Uuid) -> AppResult<Investment> {
        self.update_status(investment_id, InvestmentStatus::Completed)
            .await
    }

    /// Admin status transition along pending -> active -> {completed, cancelled}
    pub async fn update_status(
        &self,
        investment_id: Uuid,
        to: InvestmentStatus,
    ) -> AppResult<Investment> {
        let now = chrono::Utc::now().naive_utc();

        let mut tx = self.pool.begin().await.map_err(AppError::Sqlx)?;

        let mut investment = self
            .investment_repo
            .find_for_update_in_tx(&mut tx, investment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Investment {} not found", investment_id)))?;

        investment
            .transition_status(to, now)
            .map_err(AppError::BusinessLogic)?;

        let saved = self.investment_repo.save_in_tx(&mut tx, &investment).await?;

        tx.commit().await.map_err(AppError::Sqlx)?;

        info!(investment_id = %investment_id, status = %saved.status, "investment status updated");

        Ok(saved)
    }
}
