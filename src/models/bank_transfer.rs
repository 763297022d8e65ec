use crate::models::withdrawal::generate_reference;
use crate::models::workflow::{TransitionTable, WorkflowStatus};
use crate::models::Payable;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Bank transfer request status. No processing intermediate state,
/// unlike withdrawals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankTransferStatus {
    Pending,
    Approved,
    Rejected,
}

impl BankTransferStatus {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BankTransferStatus::Pending),
            "approved" => Ok(BankTransferStatus::Approved),
            "rejected" => Ok(BankTransferStatus::Rejected),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

impl WorkflowStatus for BankTransferStatus {
    fn as_str(&self) -> &'static str {
        match self {
            BankTransferStatus::Pending => "pending",
            BankTransferStatus::Approved => "approved",
            BankTransferStatus::Rejected => "rejected",
        }
    }
}

pub const BANK_TRANSFER_TRANSITIONS: TransitionTable<BankTransferStatus> = TransitionTable::new(&[
    (BankTransferStatus::Pending, BankTransferStatus::Approved),
    (BankTransferStatus::Pending, BankTransferStatus::Rejected),
]);

/// Incoming bank transfer awaiting admin verification. Approval records
/// the bank details and credits the declared amount to the requester's
/// wallet.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BankTransferRequest {
    pub id: Uuid,
    pub payable_type: String,
    pub payable_id: Uuid,
    pub amount: Option<Decimal>,
    pub bank_id: Option<Uuid>,
    pub transfer_reference: Option<String>,
    pub reference_number: String,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub action_by: Option<Uuid>,
    pub actioned_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl BankTransferRequest {
    /// Create a new pending request
    pub fn new(payable: &Payable) -> Self {
        Self {
            id: Uuid::new_v4(),
            payable_type: payable.type_str().to_string(),
            payable_id: payable.id(),
            amount: None,
            bank_id: None,
            transfer_reference: None,
            reference_number: generate_reference("BTR"),
            status: WorkflowStatus::as_str(&BankTransferStatus::Pending).to_string(),
            rejection_reason: None,
            action_by: None,
            actioned_at: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn status_enum(&self) -> BankTransferStatus {
        BankTransferStatus::from_str(&self.status).unwrap_or(BankTransferStatus::Pending)
    }

    pub fn payable(&self) -> Result<Payable, String> {
        Payable::from_parts(&self.payable_type, self.payable_id)
    }

    /// pending -> approved, recording bank details and the verified
    /// amount. Returns the amount to credit to the requester's wallet.
    pub fn approve(
        &mut self,
        admin_id: Uuid,
        bank_id: Uuid,
        transfer_reference: &str,
        amount: Decimal,
        now: NaiveDateTime,
    ) -> Result<Decimal, String> {
        if amount <= Decimal::ZERO {
            return Err("Transfer amount must be greater than zero".to_string());
        }
        BANK_TRANSFER_TRANSITIONS.ensure(self.status_enum(), BankTransferStatus::Approved)?;
        self.status = WorkflowStatus::as_str(&BankTransferStatus::Approved).to_string();
        self.bank_id = Some(bank_id);
        self.transfer_reference = Some(transfer_reference.to_string());
        self.amount = Some(amount);
        self.action_by = Some(admin_id);
        self.actioned_at = Some(now);
        Ok(amount)
    }

    /// pending -> rejected, storing the reason. Same actor field as
    /// approval.
    pub fn reject(&mut self, admin_id: Uuid, reason: &str, now: NaiveDateTime) -> Result<(), String> {
        BANK_TRANSFER_TRANSITIONS.ensure(self.status_enum(), BankTransferStatus::Rejected)?;
        self.status = WorkflowStatus::as_str(&BankTransferStatus::Rejected).to_string();
        self.rejection_reason = Some(reason.to_string());
        self.action_by = Some(admin_id);
        self.actioned_at = Some(now);
        Ok(())
    }
}
