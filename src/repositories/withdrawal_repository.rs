use crate::error::RepositoryError;
use crate::models::{Payable, WithdrawalRequest};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const WITHDRAWAL_COLUMNS: &str = "id, payable_type, payable_id, amount, reference_number, status, \
     money_withdrawn, action_by, processed_at, completed_at, rejection_reason, created_at";

pub struct WithdrawalRepository {
    pool: PgPool,
}

impl WithdrawalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new request inside a caller-owned transaction (creation
    /// is atomic with the wallet deduction)
    pub async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: &WithdrawalRequest,
    ) -> Result<WithdrawalRequest, RepositoryError> {
        let created = sqlx::query_as::<_, WithdrawalRequest>(&format!(
            r#"
            INSERT INTO withdrawal_requests
            (id, payable_type, payable_id, amount, reference_number, status, money_withdrawn)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            WITHDRAWAL_COLUMNS
        ))
        .bind(request.id)
        .bind(&request.payable_type)
        .bind(request.payable_id)
        .bind(request.amount)
        .bind(&request.reference_number)
        .bind(&request.status)
        .bind(request.money_withdrawn)
        .fetch_one(&mut **tx)
        .await?;

        Ok(created)
    }

    /// Find a request by id
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<WithdrawalRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, WithdrawalRequest>(&format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1",
            WITHDRAWAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    /// Find a request by id with a row lock, inside a caller-owned
    /// transaction
    pub async fn find_for_update_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<WithdrawalRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, WithdrawalRequest>(&format!(
            "SELECT {} FROM withdrawal_requests WHERE id = $1 FOR UPDATE",
            WITHDRAWAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(request)
    }

    /// Persist the mutable fields of a request inside a caller-owned
    /// transaction
    pub async fn save_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: &WithdrawalRequest,
    ) -> Result<WithdrawalRequest, RepositoryError> {
        save_request(&mut **tx, request).await
    }

    /// Requests for one owner, newest first
    pub async fn list_for_payable(
        &self,
        payable: &Payable,
    ) -> Result<Vec<WithdrawalRequest>, RepositoryError> {
        let requests = sqlx::query_as::<_, WithdrawalRequest>(&format!(
            r#"
            SELECT {}
            FROM withdrawal_requests
            WHERE payable_type = $1 AND payable_id = $2
            ORDER BY created_at DESC
            "#,
            WITHDRAWAL_COLUMNS
        ))
        .bind(payable.type_str())
        .bind(payable.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }
}

async fn save_request<'e, E>(
    executor: E,
    request: &WithdrawalRequest,
) -> Result<WithdrawalRequest, RepositoryError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let updated = sqlx::query_as::<_, WithdrawalRequest>(&format!(
        r#"
        UPDATE withdrawal_requests
        SET status = $2,
            money_withdrawn = $3,
            action_by = $4,
            processed_at = $5,
            completed_at = $6,
            rejection_reason = $7
        WHERE id = $1
        RETURNING {}
        "#,
        WITHDRAWAL_COLUMNS
    ))
    .bind(request.id)
    .bind(&request.status)
    .bind(request.money_withdrawn)
    .bind(request.action_by)
    .bind(request.processed_at)
    .bind(request.completed_at)
    .bind(&request.rejection_reason)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| {
        RepositoryError::NotFound(format!("Withdrawal request {} not found", request.id))
    })?;

    Ok(updated)
}
