use crate::models::workflow::{TransitionTable, WorkflowStatus};
use crate::models::InvestmentOpportunity;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How the investor participates: taking physical delivery of the
/// merchandise, or delegating and receiving a cash profit distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentType {
    Myself,
    Authorize,
}

impl InvestmentType {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "myself" => Ok(InvestmentType::Myself),
            "authorize" => Ok(InvestmentType::Authorize),
            _ => Err(format!("Invalid investment type: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentType::Myself => "myself",
            InvestmentType::Authorize => "authorize",
        }
    }
}

/// Investment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl InvestmentStatus {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(InvestmentStatus::Pending),
            "active" => Ok(InvestmentStatus::Active),
            "completed" => Ok(InvestmentStatus::Completed),
            "cancelled" => Ok(InvestmentStatus::Cancelled),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

impl WorkflowStatus for InvestmentStatus {
    fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Pending => "pending",
            InvestmentStatus::Active => "active",
            InvestmentStatus::Completed => "completed",
            InvestmentStatus::Cancelled => "cancelled",
        }
    }
}

/// pending -> active -> {completed, cancelled}
pub const INVESTMENT_TRANSITIONS: TransitionTable<InvestmentStatus> = TransitionTable::new(&[
    (InvestmentStatus::Pending, InvestmentStatus::Active),
    (InvestmentStatus::Pending, InvestmentStatus::Cancelled),
    (InvestmentStatus::Active, InvestmentStatus::Completed),
    (InvestmentStatus::Active, InvestmentStatus::Cancelled),
]);

/// Merchandise delivery sub-state, myself-type investments only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MerchandiseStatus {
    Pending,
    Arrived,
}

impl MerchandiseStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "arrived" => Some(Self::Arrived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Arrived => "arrived",
        }
    }
}

/// Profit distribution sub-state, authorize-type investments only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionStatus {
    Pending,
    Distributed,
}

impl DistributionStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "distributed" => Some(Self::Distributed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Distributed => "distributed",
        }
    }
}

/// An investor's position in one opportunity.
///
/// A second purchase of the same opportunity merges into this row rather
/// than creating another; `(opportunity_id, investor_id)` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Investment {
    pub id: Uuid,
    pub opportunity_id: Uuid,
    pub investor_id: Uuid,
    pub shares: i64,
    pub share_price: Decimal,
    pub total_investment: Decimal,
    pub total_payment_required: Decimal,
    pub investment_type: String,
    pub status: String,
    pub merchandise_status: Option<String>,
    pub distribution_status: Option<String>,
    pub expected_profit_per_share: Decimal,
    pub actual_net_profit_per_share: Option<Decimal>,
    pub distributed_profit: Option<Decimal>,
    pub merchandise_arrived_at: Option<NaiveDateTime>,
    pub distributed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Investment {
    /// Create a fresh position on an opportunity
    pub fn new(
        opportunity: &InvestmentOpportunity,
        investor_id: Uuid,
        shares: i64,
        investment_type: InvestmentType,
        expected_profit_per_share: Decimal,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let total_investment = opportunity.share_price * Decimal::from(shares);
        let total_payment_required = total_investment
            + match investment_type {
                InvestmentType::Myself => {
                    opportunity.shipping_fee_per_share * Decimal::from(shares)
                }
                InvestmentType::Authorize => Decimal::ZERO,
            };

        Self {
            id: Uuid::new_v4(),
            opportunity_id: opportunity.id,
            investor_id,
            shares,
            share_price: opportunity.share_price,
            total_investment,
            total_payment_required,
            investment_type: investment_type.as_str().to_string(),
            status: WorkflowStatus::as_str(&InvestmentStatus::Pending).to_string(),
            merchandise_status: match investment_type {
                InvestmentType::Myself => Some(MerchandiseStatus::Pending.as_str().to_string()),
                InvestmentType::Authorize => None,
            },
            distribution_status: match investment_type {
                InvestmentType::Myself => None,
                InvestmentType::Authorize => Some(DistributionStatus::Pending.as_str().to_string()),
            },
            expected_profit_per_share,
            actual_net_profit_per_share: None,
            distributed_profit: None,
            merchandise_arrived_at: None,
            distributed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn investment_type_enum(&self) -> InvestmentType {
        InvestmentType::from_str(&self.investment_type).unwrap_or(InvestmentType::Authorize)
    }

    pub fn status_enum(&self) -> InvestmentStatus {
        InvestmentStatus::from_str(&self.status).unwrap_or(InvestmentStatus::Pending)
    }

    pub fn merchandise_status_enum(&self) -> Option<MerchandiseStatus> {
        self.merchandise_status
            .as_deref()
            .and_then(MerchandiseStatus::from_str)
    }

    pub fn distribution_status_enum(&self) -> Option<DistributionStatus> {
        self.distribution_status
            .as_deref()
            .and_then(DistributionStatus::from_str)
    }

    /// Merge a follow-up purchase into this position.
    ///
    /// Totals are recomputed from the merged share count: the shipping
    /// fee applies per share for myself-type positions only.
    pub fn merge_purchase(
        &mut self,
        added_shares: i64,
        shipping_fee_per_share: Decimal,
        now: NaiveDateTime,
    ) -> Result<(), String> {
        if added_shares <= 0 {
            return Err("Share count must be greater than zero".to_string());
        }
        match self.status_enum() {
            InvestmentStatus::Pending | InvestmentStatus::Active => {}
            _ => return Err("Cannot add shares to a closed investment".to_string()),
        }
        self.shares += added_shares;
        self.total_investment = self.share_price * Decimal::from(self.shares);
        self.total_payment_required = self.total_investment
            + match self.investment_type_enum() {
                InvestmentType::Myself => shipping_fee_per_share * Decimal::from(self.shares),
                InvestmentType::Authorize => Decimal::ZERO,
            };
        self.updated_at = now;
        Ok(())
    }

    /// Record merchandise delivery. Only valid once, for myself-type
    /// positions.
    pub fn mark_merchandise_arrived(&mut self, now: NaiveDateTime) -> Result<(), String> {
        match self.investment_type_enum() {
            InvestmentType::Myself => {}
            InvestmentType::Authorize => {
                return Err(
                    "Merchandise delivery does not apply to authorize-type investments"
                        .to_string(),
                )
            }
        }
        match self.merchandise_status_enum() {
            Some(MerchandiseStatus::Arrived) => {
                return Err("Merchandise already arrived".to_string())
            }
            Some(MerchandiseStatus::Pending) | None => {}
        }
        self.merchandise_status = Some(MerchandiseStatus::Arrived.as_str().to_string());
        self.merchandise_arrived_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Record actual realized returns ahead of distribution. Only valid
    /// for authorize-type positions that have not distributed yet.
    pub fn record_actual_returns(
        &mut self,
        net_profit_per_share: Decimal,
        now: NaiveDateTime,
    ) -> Result<(), String> {
        match self.investment_type_enum() {
            InvestmentType::Authorize => {}
            InvestmentType::Myself => {
                return Err(
                    "Profit distribution does not apply to myself-type investments".to_string(),
                )
            }
        }
        if self.distribution_status_enum() == Some(DistributionStatus::Distributed) {
            return Err("Profit already distributed".to_string());
        }
        self.actual_net_profit_per_share = Some(net_profit_per_share);
        self.updated_at = now;
        Ok(())
    }

    /// Distribute the realized profit; returns the distributed amount.
    ///
    /// Guarded against repetition: the second call fails and the amount
    /// is never doubled.
    pub fn distribute_profit(&mut self, now: NaiveDateTime) -> Result<Decimal, String> {
        match self.investment_type_enum() {
            InvestmentType::Authorize => {}
            InvestmentType::Myself => {
                return Err(
                    "Profit distribution does not apply to myself-type investments".to_string(),
                )
            }
        }
        if self.distribution_status_enum() == Some(DistributionStatus::Distributed) {
            return Err("Profit already distributed".to_string());
        }
        let per_share = self
            .actual_net_profit_per_share
            .ok_or_else(|| "Actual returns not recorded yet".to_string())?;

        let amount = per_share * Decimal::from(self.shares);
        self.distributed_profit = Some(amount);
        self.distribution_status = Some(DistributionStatus::Distributed.as_str().to_string());
        self.distributed_at = Some(now);
        self.updated_at = now;
        Ok(amount)
    }

    /// Move the position along pending -> active -> {completed, cancelled}
    pub fn transition_status(
        &mut self,
        to: InvestmentStatus,
        now: NaiveDateTime,
    ) -> Result<(), String> {
        INVESTMENT_TRANSITIONS.ensure(self.status_enum(), to)?;
        self.status = WorkflowStatus::as_str(&to).to_string();
        self.updated_at = now;
        Ok(())
    }
}
