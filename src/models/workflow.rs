/// Status enums that participate in an approval workflow.
pub trait WorkflowStatus: Copy + Eq {
    /// Database string for the status
    fn as_str(&self) -> &'static str;
}

/// Allowed-transition table for a request status machine.
///
/// Withdrawal and bank-transfer requests follow the same approve/reject
/// shape with different state sets; each status enum declares its edges
/// once and every transition goes through `ensure`.
pub struct TransitionTable<S: 'static> {
    edges: &'static [(S, S)],
}

impl<S: WorkflowStatus + 'static> TransitionTable<S> {
    pub const fn new(edges: &'static [(S, S)]) -> Self {
        Self { edges }
    }

    /// Whether `from -> to` is an allowed edge
    pub fn allows(&self, from: S, to: S) -> bool {
        self.edges.iter().any(|&(f, t)| f == from && t == to)
    }

    /// Check a transition, producing the business-rule message on failure
    pub fn ensure(&self, from: S, to: S) -> Result<(), String> {
        if self.allows(from, to) {
            Ok(())
        } else {
            Err(format!(
                "Invalid status transition: {} -> {}",
                from.as_str(),
                to.as_str()
            ))
        }
    }
}
