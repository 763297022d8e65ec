//! Repository for wallets and ledger transactions.
//!
//! The balance is never stored: reads aggregate the confirmed
//! transaction rows, and every mutation runs with the owner's wallet row
//! locked (`SELECT ... FOR UPDATE`) so per-owner check-then-insert is
//! serialized and overdraft is impossible.

use crate::error::RepositoryError;
use crate::models::{Payable, TransactionType, Wallet, WalletTransaction};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get or create the wallet row for an owner
    pub async fn get_or_create_wallet(&self, payable: &Payable) -> Result<Wallet, RepositoryError> {
        upsert_wallet(&self.pool, payable).await
    }

    /// Find the wallet row for an owner, if any
    pub async fn find_wallet(&self, payable: &Payable) -> Result<Option<Wallet>, RepositoryError> {
        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
            SELECT id, payable_type, payable_id, created_at
            FROM wallets
            WHERE payable_type = $1 AND payable_id = $2
            "#,
        )
        .bind(payable.type_str())
        .bind(payable.id())
        .fetch_optional(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// Current balance: sum of confirmed deposits minus confirmed
    /// withdrawals, computed at read time
    pub async fn balance(&self, payable: &Payable) -> Result<Decimal, RepositoryError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN tx_type = 'deposit' THEN amount ELSE -amount END), 0)
            FROM wallet_transactions
            WHERE payable_type = $1 AND payable_id = $2 AND confirmed = TRUE
            "#,
        )
        .bind(payable.type_str())
        .bind(payable.id())
        .fetch_one(&self.pool)
        .await?;

        Ok(balance)
    }

    /// Record a confirmed deposit
    pub async fn deposit(
        &self,
        payable: &Payable,
        amount: Decimal,
        meta: Value,
    ) -> Result<WalletTransaction, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let record = self.deposit_in_tx(&mut tx, payable, amount, meta).await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Record a confirmed deposit inside a caller-owned transaction, so
    /// workflow services can fold the ledger write into their own atomic
    /// unit (refund-on-reject, approve-with-credit, distribution payout)
    pub async fn deposit_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payable: &Payable,
        amount: Decimal,
        meta: Value,
    ) -> Result<WalletTransaction, RepositoryError> {
        if amount <= Decimal::ZERO {
            return Err(RepositoryError::InvalidInput(
                "Amount must be greater than zero".to_string(),
            ));
        }

        let wallet = upsert_wallet(&mut **tx, payable).await?;
        lock_wallet(&mut **tx, wallet.id).await?;

        insert_transaction(
            &mut **tx,
            &wallet,
            payable,
            TransactionType::Deposit,
            amount,
            meta,
        )
        .await
    }

    /// Record a confirmed withdrawal, failing when the balance is
    /// insufficient
    pub async fn withdraw(
        &self,
        payable: &Payable,
        amount: Decimal,
        meta: Value,
    ) -> Result<WalletTransaction, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let record = self.withdraw_in_tx(&mut tx, payable, amount, meta).await?;
        tx.commit().await?;

        Ok(record)
    }

    /// Withdrawal variant for caller-owned transactions. The wallet row
    /// lock is taken before the balance check, so two concurrent
    /// withdrawals against the same owner serialize instead of both
    /// passing the check.
    pub async fn withdraw_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        payable: &Payable,
        amount: Decimal,
        meta: Value,
    ) -> Result<WalletTransaction, RepositoryError> {
        if amount <= Decimal::ZERO {
            return Err(RepositoryError::InvalidInput(
                "Amount must be greater than zero".to_string(),
            ));
        }

        let wallet = upsert_wallet(&mut **tx, payable).await?;
        lock_wallet(&mut **tx, wallet.id).await?;

        let balance = balance_on(&mut **tx, payable).await?;
        if balance < amount {
            return Err(RepositoryError::BusinessRule(format!(
                "Insufficient balance: available {}, required {}",
                balance, amount
            )));
        }

        insert_transaction(
            &mut **tx,
            &wallet,
            payable,
            TransactionType::Withdraw,
            amount,
            meta,
        )
        .await
    }

    /// Transaction history for an owner, newest first
    pub async fn transactions_for(
        &self,
        payable: &Payable,
        limit: i64,
    ) -> Result<Vec<WalletTransaction>, RepositoryError> {
        let transactions = sqlx::query_as::<_, WalletTransaction>(
            r#"
            SELECT id, wallet_id, payable_type, payable_id, tx_type, amount, confirmed, meta, created_at
            FROM wallet_transactions
            WHERE payable_type = $1 AND payable_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(payable.type_str())
        .bind(payable.id())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(transactions)
    }
}

async fn upsert_wallet<'e, E>(executor: E, payable: &Payable) -> Result<Wallet, RepositoryError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let wallet = sqlx::query_as::<_, Wallet>(
        r#"
        INSERT INTO wallets (id, payable_type, payable_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (payable_type, payable_id) DO UPDATE SET payable_type = EXCLUDED.payable_type
        RETURNING id, payable_type, payable_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payable.type_str())
    .bind(payable.id())
    .fetch_one(executor)
    .await?;

    Ok(wallet)
}

async fn lock_wallet<'e, E>(executor: E, wallet_id: Uuid) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query("SELECT id FROM wallets WHERE id = $1 FOR UPDATE")
        .bind(wallet_id)
        .fetch_one(executor)
        .await?;

    Ok(())
}

async fn balance_on<'e, E>(executor: E, payable: &Payable) -> Result<Decimal, RepositoryError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let balance = sqlx::query_scalar::<_, Decimal>(
        r#"
        SELECT COALESCE(SUM(CASE WHEN tx_type = 'deposit' THEN amount ELSE -amount END), 0)
        FROM wallet_transactions
        WHERE payable_type = $1 AND payable_id = $2 AND confirmed = TRUE
        "#,
    )
    .bind(payable.type_str())
    .bind(payable.id())
    .fetch_one(executor)
    .await?;

    Ok(balance)
}

async fn insert_transaction<'e, E>(
    executor: E,
    wallet: &Wallet,
    payable: &Payable,
    tx_type: TransactionType,
    amount: Decimal,
    meta: Value,
) -> Result<WalletTransaction, RepositoryError>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let record = sqlx::query_as::<_, WalletTransaction>(
        r#"
        INSERT INTO wallet_transactions
        (id, wallet_id, payable_type, payable_id, tx_type, amount, confirmed, meta)
        VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7)
        RETURNING id, wallet_id, payable_type, payable_id, tx_type, amount, confirmed, meta, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(wallet.id)
    .bind(payable.type_str())
    .bind(payable.id())
    .bind(tx_type.as_str())
    .bind(amount)
    .bind(meta)
    .fetch_one(executor)
    .await?;

    Ok(record)
}
