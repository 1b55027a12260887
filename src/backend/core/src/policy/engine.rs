//! Policy engine for evaluating authorization decisions.
//!
//! The policy engine answers the question:
//! "May actor X perform operation Y on target Z?"

use tracing::debug;

use super::Operation;
use crate::applications::Application;
use crate::error::{MeridianError, Result};
use crate::identity::User;

// ═══════════════════════════════════════════════════════════════════════════════
// Decision
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The operation is allowed.
    Allow,
    /// The operation is denied, with a reason.
    Deny(String),
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny(_))
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self::Deny(reason.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Target
// ═══════════════════════════════════════════════════════════════════════════════

/// The record an operation is aimed at.
///
/// For application targets the caller passes the resolved applicant user
/// when one exists, so the partner-roster rule can inspect the applicant's
/// `partner_id` without the engine doing I/O.
#[derive(Debug, Clone, Copy)]
pub enum AccessTarget<'a> {
    Application {
        application: &'a Application,
        applicant: Option<&'a User>,
    },
    Client(&'a User),
    /// Scope-level operations with no single record (roster listing).
    PartnerScope,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Policy Engine
// ═══════════════════════════════════════════════════════════════════════════════

/// Stateless access-decision engine. Rules are evaluated in a fixed
/// precedence order; the first match decides.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate an access request.
    pub fn check(&self, actor: &User, operation: Operation, target: &AccessTarget<'_>) -> PolicyDecision {
        let decision = self.evaluate(actor, operation, target);

        debug!(
            actor = %actor.id,
            role = %actor.role,
            operation = %operation,
            allowed = decision.is_allowed(),
            "Policy decision"
        );
        decision
    }

    /// Convenience: returns `Ok(())` if allowed, `Err(Forbidden)` if denied.
    pub fn enforce(
        &self,
        actor: &User,
        operation: Operation,
        target: &AccessTarget<'_>,
    ) -> Result<()> {
        match self.check(actor, operation, target) {
            PolicyDecision::Allow => Ok(()),
            PolicyDecision::Deny(reason) => Err(MeridianError::forbidden(reason)
                .with_context("operation", operation.as_str())),
        }
    }

    fn evaluate(
        &self,
        actor: &User,
        operation: Operation,
        target: &AccessTarget<'_>,
    ) -> PolicyDecision {
        // Rule 1: admin actors are allowed everything, unconditionally.
        if actor.is_admin() {
            return PolicyDecision::Allow;
        }

        if operation.is_admin_only() {
            return PolicyDecision::deny(format!(
                "{} requires administrator access",
                operation
            ));
        }

        match (operation, target) {
            (
                Operation::ViewApplication,
                AccessTarget::Application {
                    application,
                    applicant,
                },
            ) => Self::check_view_application(actor, application, *applicant),

            (Operation::ViewClientRoster, AccessTarget::PartnerScope) => {
                if actor.is_partner() {
                    PolicyDecision::Allow
                } else {
                    PolicyDecision::deny("client roster is available to partner accounts only")
                }
            }

            (Operation::ViewClientDetail, AccessTarget::Client(client))
            | (Operation::DisassociateClient, AccessTarget::Client(client)) => {
                if !actor.is_partner() {
                    PolicyDecision::deny(format!(
                        "{} is available to partner accounts only",
                        operation
                    ))
                } else if actor.has_client(client) {
                    PolicyDecision::Allow
                } else {
                    PolicyDecision::deny(format!(
                        "user {} is not on partner {}'s roster",
                        client.id, actor.id
                    ))
                }
            }

            // Operation aimed at the wrong kind of target.
            _ => PolicyDecision::deny(format!("{} is not permitted for this target", operation)),
        }
    }

    fn check_view_application(
        actor: &User,
        application: &Application,
        applicant: Option<&User>,
    ) -> PolicyDecision {
        if application.applicant_details.user_id.as_ref() == Some(&actor.id) {
            return PolicyDecision::Allow;
        }
        if application.submitted_by.user_id == actor.id {
            return PolicyDecision::Allow;
        }
        if let Some(applicant) = applicant {
            if actor.has_client(applicant) {
                return PolicyDecision::Allow;
            }
        }
        PolicyDecision::deny(format!(
            "user {} is neither applicant, submitter, nor managing partner of application {}",
            actor.id, application.id
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
