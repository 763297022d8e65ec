use crate::error::RepositoryError;
use crate::models::Investment;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const INVESTMENT_COLUMNS: &str = "id, opportunity_id, investor_id, shares, share_price, \
     total_investment, total_payment_required, investment_type, status, merchandise_status, \
     distribution_status, expected_profit_per_share, actual_net_profit_per_share, \
     distributed_profit, merchandise_arrived_at, distributed_at, created_at, updated_at";

pub struct InvestmentRepository {
    pool: PgPool,
}

impl InvestmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an investment by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Investment>, RepositoryError> {
        let investment = sqlx::query_as::<_, Investment>(&format!(
            "SELECT {} FROM investments WHERE id = $1",
            INVESTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(investment)
    }

    /// Find an investment by id with a row lock, inside a caller-owned
    /// transaction
    pub async fn find_for_update_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Investment>, RepositoryError> {
        let investment = sqlx::query_as::<_, Investment>(&format!(
            "SELECT {} FROM investments WHERE id = $1 FOR UPDATE",
            INVESTMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(investment)
    }

    /// The merge target for a re-investment: the investor's existing row
    /// on the opportunity, locked
    pub async fn find_position_for_update_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        opportunity_id: Uuid,
        investor_id: Uuid,
    ) -> Result<Option<Investment>, RepositoryError> {
        let investment = sqlx::query_as::<_, Investment>(&format!(
            r#"
            SELECT {}
            FROM investments
            WHERE opportunity_id = $1 AND investor_id = $2
            FOR UPDATE
            "#,
            INVESTMENT_COLUMNS
        ))
        .bind(opportunity_id)
        .bind(investor_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(investment)
    }

    /// Insert a new investment row inside a caller-owned transaction
    pub async fn insert_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        investment: &Investment,
    ) -> Result<Investment, RepositoryError> {
        let created = sqlx::query_as::<_, Investment>(&format!(
            r#"
            INSERT INTO investments
            (id, opportunity_id, investor_id, shares, share_price, total_investment,
             total_payment_required, investment_type, status, merchandise_status,
             distribution_status, expected_profit_per_share)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            INVESTMENT_COLUMNS
        ))
        .bind(investment.id)
        .bind(investment.opportunity_id)
        .bind(investment.investor_id)
        .bind(investment.shares)
        .bind(investment.share_price)
        .bind(investment.total_investment)
        .bind(investment.total_payment_required)
        .bind(&investment.investment_type)
        .bind(&investment.status)
        .bind(&investment.merchandise_status)
        .bind(&investment.distribution_status)
        .bind(investment.expected_profit_per_share)
        .fetch_one(&mut **tx)
        .await?;

        Ok(created)
    }

    /// Persist the mutable fields of an investment inside a caller-owned
    /// transaction
    pub async fn save_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        investment: &Investment,
    ) -> Result<Investment, RepositoryError> {
        save_investment(&mut **tx, investment).await
    }

    /// All investments on an opportunity
    pub async fn list_by_opportunity(
        &self,
        opportunity_id: Uuid,
    ) -> Result<Vec<Investment>, RepositoryError> {
        let investments = sqlx::query_as::<_, Investment>(&format!(
            r#"
            SELECT {}
            FROM investments
            WHERE opportunity_id = $1
            ORDER BY created_at DESC
            "#,
            INVESTMENT_COLUMNS
        ))
        .bind(opportunity_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(investments)
    }

    /// All of one investor's positions
    pub async fn list_by_investor(
        &self,
        investor_id: Uuid,
    ) -> Result<Vec<Investment>, RepositoryError> {
        let investments = sqlx::query_as::<_, Investment>(&format!(
            r#"
            SELECT {}
            FROM investments
            WHERE investor_id = $1
            ORDER BY created_at DESC
            "#,
            INVESTMENT_COLUMNS
        ))
        .bind(investor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(investments)
    }
}

async fn save_investment<'e, E>(
    executor: E,
    investment: &Investment,
) -> Result<Investment, RepositoryError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let updated = sqlx::query_as::<_, Investment>(&format!(
        r#"
        UPDATE investments
        SET shares = $2,
            total_investment = $3,
            total_payment_required = $4,
            status = $5,
            merchandise_status = $6,
            distribution_status = $7,
            actual_net_profit_per_share = $8,
            distributed_profit = $9,
            merchandise_arrived_at = $10,
            distributed_at = $11,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        INVESTMENT_COLUMNS
    ))
    .bind(investment.id)
    .bind(investment.shares)
    .bind(investment.total_investment)
    .bind(investment.total_payment_required)
    .bind(&investment.status)
    .bind(&investment.merchandise_status)
    .bind(&investment.distribution_status)
    .bind(investment.actual_net_profit_per_share)
    .bind(investment.distributed_profit)
    .bind(investment.merchandise_arrived_at)
    .bind(investment.distributed_at)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| RepositoryError::NotFound(format!("Investment {} not found", investment.id)))?;

    Ok(updated)
}
