//! Policy-gated portal operations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of operations the policy engine decides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Read a single application record.
    ViewApplication,
    /// List a partner's clients and their applications.
    ViewClientRoster,
    /// Read a single roster client.
    ViewClientDetail,
    /// Move a client to another partner's roster.
    ReassignClient,
    /// Sever the roster linkage (clear `partner_id`); keeps the user and
    /// their applications.
    DisassociateClient,
    /// Delete the client record and cascade over their applications.
    PermanentlyDeleteClient,
    /// Change an application's lifecycle status.
    UpdateApplicationStatus,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Self::ViewApplication,
        Self::ViewClientRoster,
        Self::ViewClientDetail,
        Self::ReassignClient,
        Self::DisassociateClient,
        Self::PermanentlyDeleteClient,
        Self::UpdateApplicationStatus,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ViewApplication => "view_application",
            Self::ViewClientRoster => "view_client_roster",
            Self::ViewClientDetail => "view_client_detail",
            Self::ReassignClient => "reassign_client",
            Self::DisassociateClient => "disassociate_client",
            Self::PermanentlyDeleteClient => "permanently_delete_client",
            Self::UpdateApplicationStatus => "update_application_status",
        }
    }

    /// Operations with no partner or applicant path at all.
    pub const fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Self::ReassignClient | Self::PermanentlyDeleteClient | Self::UpdateApplicationStatus
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
