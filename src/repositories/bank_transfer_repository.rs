use crate::error::RepositoryError;
use crate::models::BankTransferRequest;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const TRANSFER_COLUMNS: &str = "id, payable_type, payable_id, amount, bank_id, transfer_reference, \
     reference_number, status, rejection_reason, action_by, actioned_at, created_at";

pub struct BankTransferRepository {
    pool: PgPool,
}

impl BankTransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new request
    pub async fn create(
        &self,
        request: &BankTransferRequest,
    ) -> Result<BankTransferRequest, RepositoryError> {
        let created = sqlx::query_as::<_, BankTransferRequest>(&format!(
            r#"
            INSERT INTO bank_transfer_requests
            (id, payable_type, payable_id, reference_number, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            TRANSFER_COLUMNS
        ))
        .bind(request.id)
        .bind(&request.payable_type)
        .bind(request.payable_id)
        .bind(&request.reference_number)
        .bind(&request.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Find a request by id
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<BankTransferRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, BankTransferRequest>(&format!(
            "SELECT {} FROM bank_transfer_requests WHERE id = $1",
            TRANSFER_COLUMNS
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
    ) -> Result<Option<BankTransferRequest>, RepositoryError> {
        let request = sqlx::query_as::<_, BankTransferRequest>(&format!(
            "SELECT {} FROM bank_transfer_requests WHERE id = $1 FOR UPDATE",
            TRANSFER_COLUMNS
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
        request: &BankTransferRequest,
    ) -> Result<BankTransferRequest, RepositoryError> {
        save_request(&mut **tx, request).await
    }
}

async fn save_request<'e, E>(
    executor: E,
    request: &BankTransferRequest,
) -> Result<BankTransferRequest, RepositoryError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let updated = sqlx::query_as::<_, BankTransferRequest>(&format!(
        r#"
        UPDATE bank_transfer_requests
        SET amount = $2,
            bank_id = $3,
            transfer_reference = $4,
            status = $5,
            rejection_reason = $6,
            action_by = $7,
            actioned_at = $8
        WHERE id = $1
        RETURNING {}
        "#,
        TRANSFER_COLUMNS
    ))
    .bind(request.id)
    .bind(request.amount)
    .bind(request.bank_id)
    .bind(&request.transfer_reference)
    .bind(&request.status)
    .bind(&request.rejection_reason)
    .bind(request.action_by)
    .bind(request.actioned_at)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| {
        RepositoryError::NotFound(format!("Bank transfer request {} not found", request.id))
    })?;

    Ok(updated)
}
