use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Opportunity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpportunityStatus {
    Pending,
    Open,
    Active,
    Completed,
    Cancelled,
    Suspended,
}

impl OpportunityStatus {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OpportunityStatus::Pending),
            "open" => Ok(OpportunityStatus::Open),
            "active" => Ok(OpportunityStatus::Active),
            "completed" => Ok(OpportunityStatus::Completed),
            "cancelled" => Ok(OpportunityStatus::Cancelled),
            "suspended" => Ok(OpportunityStatus::Suspended),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityStatus::Pending => "pending",
            OpportunityStatus::Open => "open",
            OpportunityStatus::Active => "active",
            OpportunityStatus::Completed => "completed",
            OpportunityStatus::Cancelled => "cancelled",
            OpportunityStatus::Suspended => "suspended",
        }
    }
}

impl From<String> for OpportunityStatus {
    fn from(s: String) -> Self {
        Self::from_str(&s).unwrap_or(OpportunityStatus::Pending)
    }
}

impl From<OpportunityStatus> for String {
    fn from(status: OpportunityStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Investment opportunity with a fixed funding target sold in shares.
///
/// `reserved_shares` tracks purchases against the cap; the cap itself is
/// derived from `target_amount / share_price`, never stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InvestmentOpportunity {
    pub id: Uuid,
    pub title: String,
    pub target_amount: Decimal,
    pub share_price: Decimal,
    pub shipping_fee_per_share: Decimal,
    pub reserved_shares: i64,
    pub status: String,
    pub show: bool,
    pub offering_starts_at: Option<NaiveDateTime>,
    pub offering_ends_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl InvestmentOpportunity {
    /// Create a new opportunity in pending state
    pub fn new(
        title: String,
        target_amount: Decimal,
        share_price: Decimal,
        shipping_fee_per_share: Decimal,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            title,
            target_amount,
            share_price,
            shipping_fee_per_share,
            reserved_shares: 0,
            status: OpportunityStatus::Pending.as_str().to_string(),
            show: false,
            offering_starts_at: None,
            offering_ends_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Total number of shares on offer: floor(target_amount / share_price)
    pub fn total_shares(&self) -> i64 {
        if self.share_price <= Decimal::ZERO {
            return 0;
        }
        (self.target_amount / self.share_price)
            .floor()
            .to_i64()
            .unwrap_or(0)
    }

    /// Shares still available for purchase
    pub fn remaining_shares(&self) -> i64 {
        (self.total_shares() - self.reserved_shares).max(0)
    }

    /// Funding progress as a percentage of total shares
    pub fn completion_rate(&self) -> Decimal {
        let total = self.total_shares();
        if total == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.reserved_shares) / Decimal::from(total) * Decimal::from(100)
    }

    /// Get status as an enum
    pub fn status_enum(&self) -> OpportunityStatus {
        OpportunityStatus::from_str(&self.status).unwrap_or(OpportunityStatus::Pending)
    }

    /// Whether the opportunity currently accepts purchases
    pub fn is_open_for_investment(&self) -> bool {
        matches!(
            self.status_enum(),
            OpportunityStatus::Open | OpportunityStatus::Active
        ) && self.remaining_shares() > 0
    }
}
