//! Status lifecycle.
//!
//! The standard flow is `Submitted -> {In Review, Rejected} ->
//! {Approved, Rejected} -> Archived`, but the transition contract is
//! deliberately permissive: admins may move an application between any two
//! statuses to correct mistakes (e.g. Approved back to In Review).
//! Non-standard transitions are logged, never rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApplicationId, ApplicationStatus, ServiceCategory};
use crate::identity::UserId;

impl ApplicationStatus {
    /// Successor statuses on the standard review flow.
    pub const fn standard_successors(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Submitted => &[InReview, Rejected],
            InReview => &[Approved, Rejected],
            Approved => &[Archived],
            Rejected => &[Archived],
            Archived => &[],
        }
    }

    /// Whether `target` follows this status on the standard flow. Purely
    /// informational: the update operation accepts every transition.
    pub fn is_standard_transition(&self, target: &ApplicationStatus) -> bool {
        self.standard_successors().contains(target)
    }
}

/// Record of a performed status transition, returned to the caller and
/// carried by the status notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub application_id: ApplicationId,
    pub service_category: ServiceCategory,
    pub application_type: String,
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub changed_by: UserId,
    pub changed_at: DateTime<Utc>,
}
