//! Identity models: users, roles, partner profiles, and session resolution.
//!
//! Authentication itself is an external collaborator; this module owns the
//! user/role data model, the [`SessionResolver`] seam that turns an opaque
//! session token into a [`User`], and a store-backed resolver for
//! development and tests. Every portal operation takes the resolved actor as
//! an explicit parameter; there is no ambient current-user state.

mod session;

pub use session::{token_fingerprint, SessionResolver, StoreSessionResolver};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════════════════════════
// Identifiers
// ═══════════════════════════════════════════════════════════════════════════════

/// Strongly-typed user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
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

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Role
// ═══════════════════════════════════════════════════════════════════════════════

/// Account role. Immutable after signup except for admin-granted promotions,
/// which happen outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// End user; may be recruited by a partner (`partner_id` set).
    Normal,
    /// Intermediary managing a roster of recruited end users.
    Partner,
    /// Full override on every operation.
    Admin,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Partner => "partner",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// User
// ═══════════════════════════════════════════════════════════════════════════════

/// A portal user. Also serves as the actor on every policy-checked
/// operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
    pub role: Role,

    /// Partner-specific business model label (loans, CA services, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_model: Option<String>,

    /// Weak back-reference to the recruiting partner. Set only for `normal`
    /// users; cleared by disassociation. Never owns the partner's lifecycle.
    #[serde(default)]
    pub partner_id: Option<UserId>,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user record with a generated id.
    pub fn new(full_name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::generate(),
            full_name: full_name.into(),
            email: email.into(),
            role,
            business_model: None,
            partner_id: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the recruiting partner reference.
    pub fn recruited_by(mut self, partner_id: UserId) -> Self {
        self.partner_id = Some(partner_id);
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_partner(&self) -> bool {
        self.role == Role::Partner
    }

    /// Check whether `client` is on this user's partner roster.
    pub fn has_client(&self, client: &User) -> bool {
        self.is_partner() && client.partner_id.as_ref() == Some(&self.id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Partner Profile
// ═══════════════════════════════════════════════════════════════════════════════

/// Entry on the approved-partner list (`partners` collection). The id is the
/// partner's user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerProfile {
    pub id: UserId,
    pub company_name: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl PartnerProfile {
    pub fn new(id: UserId, company_name: impl Into<String>) -> Self {
        Self {
            id,
            company_name: company_name.into(),
            approved: false,
            created_at: Utc::now(),
        }
    }

    pub fn approved(mut self) -> Self {
        self.approved = true;
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        let json = serde_json::to_string(&Role::Partner).unwrap();
        assert_eq!(json, "\"partner\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_has_client() {
        let partner = User::new("Priya Shah", "priya@partner.example", Role::Partner);
        let client = User::new("Arun Mehta", "arun@example.com", Role::Normal)
            .recruited_by(partner.id.clone());
        let stranger = User::new("Noor Ali", "noor@example.com", Role::Normal);

        assert!(partner.has_client(&client));
        assert!(!partner.has_client(&stranger));
        // A normal user never has clients, even with matching ids.
        assert!(!client.has_client(&client));
    }

    #[test]
    fn test_partner_id_survives_null_round_trip() {
        let user = User::new("Arun Mehta", "arun@example.com", Role::Normal);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("partner_id").unwrap().is_null());

        let back: User = serde_json::from_value(json).unwrap();
        assert!(back.partner_id.is_none());
    }
}
