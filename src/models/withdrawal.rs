use crate::models::workflow::{TransitionTable, WorkflowStatus};
use crate::models::Payable;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Withdrawal request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Processing,
    Completed,
    Rejected,
    Cancelled,
}

impl WithdrawalStatus {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(WithdrawalStatus::Pending),
            "processing" => Ok(WithdrawalStatus::Processing),
            "completed" => Ok(WithdrawalStatus::Completed),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            "cancelled" => Ok(WithdrawalStatus::Cancelled),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

impl WorkflowStatus for WithdrawalStatus {
    fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::Rejected => "rejected",
            WithdrawalStatus::Cancelled => "cancelled",
        }
    }
}

/// pending -> processing -> completed, with rejection allowed from
/// pending or processing and cancellation from pending only
pub const WITHDRAWAL_TRANSITIONS: TransitionTable<WithdrawalStatus> = TransitionTable::new(&[
    (WithdrawalStatus::Pending, WithdrawalStatus::Processing),
    (WithdrawalStatus::Processing, WithdrawalStatus::Completed),
    (WithdrawalStatus::Pending, WithdrawalStatus::Rejected),
    (WithdrawalStatus::Processing, WithdrawalStatus::Rejected),
    (WithdrawalStatus::Pending, WithdrawalStatus::Cancelled),
]);

/// Withdrawal request against an owner's wallet.
///
/// `money_withdrawn` records whether the funds were deducted from the
/// wallet when the request was created; it decides whether rejection or
/// cancellation must refund.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub payable_type: String,
    pub payable_id: Uuid,
    pub amount: Decimal,
    pub reference_number: String,
    pub status: String,
    pub money_withdrawn: bool,
    pub action_by: Option<Uuid>,
    pub processed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub rejection_reason: Option<String>,
    pub created_at: NaiveDateTime,
}

impl WithdrawalRequest {
    /// Create a new pending request
    pub fn new(payable: &Payable, amount: Decimal, money_withdrawn: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            payable_type: payable.type_str().to_string(),
            payable_id: payable.id(),
            amount,
            reference_number: generate_reference("WDR"),
            status: WorkflowStatus::as_str(&WithdrawalStatus::Pending).to_string(),
            money_withdrawn,
            action_by: None,
            processed_at: None,
            completed_at: None,
            rejection_reason: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn status_enum(&self) -> WithdrawalStatus {
        WithdrawalStatus::from_str(&self.status).unwrap_or(WithdrawalStatus::Pending)
    }

    pub fn payable(&self) -> Result<Payable, String> {
        Payable::from_parts(&self.payable_type, self.payable_id)
    }

    /// pending -> processing. Requires the funds to have been deducted
    /// at request creation.
    pub fn begin_processing(&mut self, admin_id: Uuid, now: NaiveDateTime) -> Result<(), String> {
        if !self.money_withdrawn {
            return Err("Cannot process a request whose funds were not withdrawn".to_string());
        }
        WITHDRAWAL_TRANSITIONS.ensure(self.status_enum(), WithdrawalStatus::Processing)?;
        self.status = WorkflowStatus::as_str(&WithdrawalStatus::Processing).to_string();
        self.action_by = Some(admin_id);
        self.processed_at = Some(now);
        Ok(())
    }

    /// processing -> completed. No skipping from pending.
    pub fn complete(&mut self, admin_id: Uuid, now: NaiveDateTime) -> Result<(), String> {
        if !self.money_withdrawn {
            return Err("Cannot complete a request whose funds were not withdrawn".to_string());
        }
        WITHDRAWAL_TRANSITIONS.ensure(self.status_enum(), WithdrawalStatus::Completed)?;
        self.status = WorkflowStatus::as_str(&WithdrawalStatus::Completed).to_string();
        self.action_by = Some(admin_id);
        self.completed_at = Some(now);
        Ok(())
    }

    /// Reject the request. Returns the amount to refund when the funds
    /// were deducted at creation; the flag flips so a second rejection
    /// can never refund twice.
    pub fn reject(
        &mut self,
        admin_id: Uuid,
        reason: &str,
        now: NaiveDateTime,
    ) -> Result<Option<Decimal>, String> {
        WITHDRAWAL_TRANSITIONS.ensure(self.status_enum(), WithdrawalStatus::Rejected)?;
        self.status = WorkflowStatus::as_str(&WithdrawalStatus::Rejected).to_string();
        self.action_by = Some(admin_id);
        self.rejection_reason = Some(reason.to_string());
        self.processed_at = Some(now);
        Ok(self.take_refund())
    }

    /// Cancel a still-pending request. Same refund semantics as reject.
    pub fn cancel(&mut self, now: NaiveDateTime) -> Result<Option<Decimal>, String> {
        WITHDRAWAL_TRANSITIONS.ensure(self.status_enum(), WithdrawalStatus::Cancelled)?;
        self.status = WorkflowStatus::as_str(&WithdrawalStatus::Cancelled).to_string();
        self.processed_at = Some(now);
        Ok(self.take_refund())
    }

    fn take_refund(&mut self) -> Option<Decimal> {
        if self.money_withdrawn {
            self.money_withdrawn = false;
            Some(self.amount)
        } else {
            None
        }
    }
}

/// Generate a human-facing reference number, e.g. `WDR-9F2A61B0`
pub fn generate_reference(prefix: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, token[..8].to_uppercase())
}
