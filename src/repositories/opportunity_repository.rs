use crate::error::RepositoryError;
use crate::models::InvestmentOpportunity;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const OPPORTUNITY_COLUMNS: &str = "id, title, target_amount, share_price, shipping_fee_per_share, \
     reserved_shares, status, show, offering_starts_at, offering_ends_at, created_at, updated_at";

pub struct OpportunityRepository {
    pool: PgPool,
}

impl OpportunityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new opportunity
    pub async fn create(
        &self,
        opportunity: &InvestmentOpportunity,
    ) -> Result<InvestmentOpportunity, RepositoryError> {
        let created = sqlx::query_as::<_, InvestmentOpportunity>(&format!(
            r#"
            INSERT INTO investment_opportunities
            (id, title, target_amount, share_price, shipping_fee_per_share, reserved_shares,
             status, show, offering_starts_at, offering_ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            OPPORTUNITY_COLUMNS
        ))
        .bind(opportunity.id)
        .bind(&opportunity.title)
        .bind(opportunity.target_amount)
        .bind(opportunity.share_price)
        .bind(opportunity.shipping_fee_per_share)
        .bind(opportunity.reserved_shares)
        .bind(&opportunity.status)
        .bind(opportunity.show)
        .bind(opportunity.offering_starts_at)
        .bind(opportunity.offering_ends_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Find an opportunity by id
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<InvestmentOpportunity>, RepositoryError> {
        let opportunity = sqlx::query_as::<_, InvestmentOpportunity>(&format!(
            "SELECT {} FROM investment_opportunities WHERE id = $1",
            OPPORTUNITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(opportunity)
    }

    /// Opportunities currently visible and accepting investment
    pub async fn list_open(&self) -> Result<Vec<InvestmentOpportunity>, RepositoryError> {
        let opportunities = sqlx::query_as::<_, InvestmentOpportunity>(&format!(
            r#"
            SELECT {}
            FROM investment_opportunities
            WHERE status IN ('open', 'active') AND show = TRUE
            ORDER BY created_at DESC
            "#,
            OPPORTUNITY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(opportunities)
    }

    /// Update the status column
    pub async fn set_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> Result<InvestmentOpportunity, RepositoryError> {
        let updated = sqlx::query_as::<_, InvestmentOpportunity>(&format!(
            r#"
            UPDATE investment_opportunities
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            OPPORTUNITY_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(format!("Opportunity {} not found", id)))?;

        Ok(updated)
    }

    /// Guarded compare-and-increment of `reserved_shares`.
    ///
    /// The WHERE clause re-derives the share cap from the same row, so
    /// the increment only lands while `reserved_shares + n` stays within
    /// `floor(target_amount / share_price)`; concurrent purchases near
    /// full subscription lose cleanly instead of over-reserving.
    pub async fn reserve_shares_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        shares: i64,
    ) -> Result<InvestmentOpportunity, RepositoryError> {
        if shares <= 0 {
            return Err(RepositoryError::InvalidInput(
                "Share count must be greater than zero".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, InvestmentOpportunity>(&format!(
            r#"
            UPDATE investment_opportunities
            SET reserved_shares = reserved_shares + $2, updated_at = NOW()
            WHERE id = $1
              AND reserved_shares + $2 <= FLOOR(target_amount / share_price)
            RETURNING {}
            "#,
            OPPORTUNITY_COLUMNS
        ))
        .bind(id)
        .bind(shares)
        .fetch_optional(&mut **tx)
        .await?;

        match updated {
            Some(opportunity) => Ok(opportunity),
            None => {
                let exists = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM investment_opportunities WHERE id = $1",
                )
                .bind(id)
                .fetch_one(&mut **tx)
                .await?;

                if exists == 0 {
                    Err(RepositoryError::NotFound(format!(
                        "Opportunity {} not found",
                        id
                    )))
                } else {
                    Err(RepositoryError::BusinessRule(format!(
                        "Not enough shares remaining to reserve {}",
                        shares
                    )))
                }
            }
        }
    }

    /// Pool-level variant of the guarded reservation
    pub async fn reserve_shares(
        &self,
        id: Uuid,
        shares: i64,
    ) -> Result<InvestmentOpportunity, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let updated = self.reserve_shares_in_tx(&mut tx, id, shares).await?;
        tx.commit().await?;

        Ok(updated)
    }
}
