use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Polymorphic owner of a wallet.
///
/// Every ledger row is keyed by a `(payable_type, payable_id)` pair; this
/// enum is the typed form of that pair, matched exhaustively wherever it
/// is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Payable {
    User(Uuid),
    InvestorProfile(Uuid),
    OwnerProfile(Uuid),
}

impl Payable {
    /// Database string for the owner type
    pub fn type_str(&self) -> &'static str {
        match self {
            Payable::User(_) => "user",
            Payable::InvestorProfile(_) => "investor_profile",
            Payable::OwnerProfile(_) => "owner_profile",
        }
    }

    /// Owner id
    pub fn id(&self) -> Uuid {
        match self {
            Payable::User(id) | Payable::InvestorProfile(id) | Payable::OwnerProfile(id) => *id,
        }
    }

    /// Reconstruct from a stored `(payable_type, payable_id)` pair
    pub fn from_parts(payable_type: &str, payable_id: Uuid) -> Result<Self, String> {
        match payable_type {
            "user" => Ok(Payable::User(payable_id)),
            "investor_profile" => Ok(Payable::InvestorProfile(payable_id)),
            "owner_profile" => Ok(Payable::OwnerProfile(payable_id)),
            other => Err(format!("Unknown payable type: {}", other)),
        }
    }
}

impl std::fmt::Display for Payable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.type_str(), self.id())
    }
}
