use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Ticket counts by status over one snapshot of the ticket table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: u64,
    pub pending: u64,
    pub processing: u64,
    pub resolved: u64,
}

impl StatusCounts {
    /// `true` when the per-status counts add up to `total`.
    pub fn is_consistent(&self) -> bool {
        self.pending + self.processing + self.resolved == self.total
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeCounts {
    pub total: u64,
    pub resolved: u64,
}

/// Dean-facing per-faculty statistics row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyStats {
    pub id: UserId,
    pub name: String,
    pub username: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub total_assigned: u64,
    pub resolved: u64,
    /// Not yet resolved: `total_assigned - resolved`.
    pub pending: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consistency_check() {
        let ok = StatusCounts { total: 5, pending: 2, processing: 1, resolved: 2 };
        assert!(ok.is_consistent());
        let bad = StatusCounts { total: 5, pending: 2, processing: 2, resolved: 2 };
        assert!(!bad.is_consistent());
        assert!(StatusCounts::default().is_consistent());
    }
}
