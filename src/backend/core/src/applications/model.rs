//! Application data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::identity::{User, UserId};
use crate::store::Collection;

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed application identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Service Category
// ═══════════════════════════════════════════════════════════════════════════════

/// Tagged service category. Category-specific form payloads live in
/// `Application::form_data`; there is no inheritance hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Loan,
    CaService,
    GovernmentScheme,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 3] = [Self::Loan, Self::CaService, Self::GovernmentScheme];

    /// Pure mapping from category to its store collection.
    pub const fn collection(&self) -> Collection {
        match self {
            Self::Loan => Collection::LoanApplications,
            Self::CaService => Collection::CaServiceApplications,
            Self::GovernmentScheme => Collection::GovernmentSchemeApplications,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loan => "loan",
            Self::CaService => "ca_service",
            Self::GovernmentScheme => "government_scheme",
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ServiceCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "loan" => Ok(Self::Loan),
            "ca_service" => Ok(Self::CaService),
            "government_scheme" => Ok(Self::GovernmentScheme),
            other => Err(format!(
                "unknown service category '{}' (expected loan, ca_service, or government_scheme)",
                other
            )),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Status
// ═══════════════════════════════════════════════════════════════════════════════

/// Application status. The wire format keeps the human-facing labels used in
/// status notifications ("In Review", not "in_review").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Submitted,
    #[serde(rename = "In Review")]
    InReview,
    Approved,
    Rejected,
    Archived,
}

impl ApplicationStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::InReview => "In Review",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Archived => "Archived",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Submitted" => Ok(Self::Submitted),
            "In Review" => Ok(Self::InReview),
            "Approved" => Ok(Self::Approved),
            "Rejected" => Ok(Self::Rejected),
            "Archived" => Ok(Self::Archived),
            other => Err(format!(
                "unknown status '{}' (expected Submitted, In Review, Approved, Rejected, or Archived)",
                other
            )),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Parties
// ═══════════════════════════════════════════════════════════════════════════════

/// The user on whose behalf the application was filed. `user_id` may be null
/// for walk-in applicants without a portal account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantDetails {
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub full_name: String,
    pub email: String,
}

impl ApplicantDetails {
    pub fn of(user: &User) -> Self {
        Self {
            user_id: Some(user.id.clone()),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
        }
    }
}

/// The user who performed the submission action. Differs from the applicant
/// when a partner files on a client's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedBy {
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
}

impl SubmittedBy {
    pub fn of(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            user_name: user.full_name.clone(),
            user_email: user.email.clone(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Application
// ═══════════════════════════════════════════════════════════════════════════════

/// A submitted application. Status is `Submitted` at creation, mutated only
/// through the admin status-update operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub service_category: ServiceCategory,

    /// Free-form subtype label ("home_loan", "gst_registration", ...).
    pub application_type: String,

    pub applicant_details: ApplicantDetails,
    pub submitted_by: SubmittedBy,
    pub status: ApplicationStatus,

    /// Managing-partner linkage: set when a partner files for a client,
    /// updated by reassignment and by the client-removal cascade.
    #[serde(default)]
    pub partner_id: Option<UserId>,

    pub created_at: DateTime<Utc>,

    /// Category-specific payload. File fields hold public URLs, never bytes.
    pub form_data: Value,
}

impl Application {
    /// Create a new application in the initial `Submitted` state.
    pub fn new(
        service_category: ServiceCategory,
        application_type: impl Into<String>,
        applicant_details: ApplicantDetails,
        submitted_by: SubmittedBy,
        form_data: Value,
    ) -> Self {
        Self {
            id: ApplicationId::generate(),
            service_category,
            application_type: application_type.into(),
            applicant_details,
            submitted_by,
            status: ApplicationStatus::Submitted,
            partner_id: None,
            created_at: Utc::now(),
            form_data,
        }
    }

    /// Whether the given user is applicant or submitter on this record.
    pub fn involves(&self, user_id: &UserId) -> bool {
        self.applicant_details.user_id.as_ref() == Some(user_id)
            || &self.submitted_by.user_id == user_id
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
