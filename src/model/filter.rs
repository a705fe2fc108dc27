//! Fixed status filters for listing dispatches.

use super::DispatchStatus;

/// Which dispatches a listing includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    InProgress,
    Completed,
}

impl StatusFilter {
    /// Whether a dispatch with `status` passes this filter.
    pub fn matches(self, status: DispatchStatus) -> bool {
        match self {
            Self::All => true,
            Self::InProgress => status == DispatchStatus::InProgress,
            Self::Completed => status == DispatchStatus::Completed,
        }
    }
}
