//! Client roster projection.
//!
//! Derives, per partner, the set of recruited end users together with every
//! application they are applicant or submitter on, across all three service
//! categories. The projection is degraded-but-available: a failed category
//! query drops that category's applications and flags the result instead of
//! aborting the aggregation.

use serde::Serialize;

use crate::applications::{Application, ServiceCategory};
use crate::identity::User;

/// One roster entry: a client and their applications, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ClientApplications {
    pub client: User,
    pub applications: Vec<Application>,
}

/// The full roster projection for a partner.
#[derive(Debug, Clone, Serialize)]
pub struct RosterProjection {
    pub entries: Vec<ClientApplications>,
    /// Categories whose query failed; empty when the projection is complete.
    pub failed_categories: Vec<ServiceCategory>,
}

impl RosterProjection {
    /// Whether any category query failed during aggregation.
    pub fn is_degraded(&self) -> bool {
        !self.failed_categories.is_empty()
    }

    pub fn application_count(&self) -> usize {
        self.entries.iter().map(|e| e.applications.len()).sum()
    }
}

/// Assemble the projection from roster members and the merged application
/// scan.
///
/// Each application is attached to at most one entry: the applicant match
/// wins over the submitter match, so a partner-filed application shows under
/// the client it was filed for.
pub(crate) fn assemble(
    clients: Vec<User>,
    applications: Vec<Application>,
    failed_categories: Vec<ServiceCategory>,
) -> RosterProjection {
    let mut entries: Vec<ClientApplications> = clients
        .into_iter()
        .map(|client| ClientApplications {
            client,
            applications: Vec::new(),
        })
        .collect();

    for application in applications {
        let by_applicant = entries.iter_mut().find(|entry| {
            application.applicant_details.user_id.as_ref() == Some(&entry.client.id)
        });
        let slot = match by_applicant {
            Some(entry) => Some(entry),
            None => entries
                .iter_mut()
                .find(|entry| application.submitted_by.user_id == entry.client.id),
        };
        if let Some(entry) = slot {
            entry.applications.push(application);
        }
    }

    for entry in &mut entries {
        entry
            .applications
            .sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
    entries.sort_by(|a, b| a.client.full_name.cmp(&b.client.full_name));

    RosterProjection {
        entries,
        failed_categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::{ApplicantDetails, SubmittedBy};
    use crate::identity::Role;
    use chrono::Duration;

    fn app_for(applicant: &User, submitter: &User, age_hours: i64) -> Application {
        let mut app = Application::new(
            ServiceCategory::Loan,
            "home_loan",
            ApplicantDetails::of(applicant),
            SubmittedBy::of(submitter),
            serde_json::json!({}),
        );
        app.created_at -= Duration::hours(age_hours);
        app
    }

    #[test]
    fn test_assemble_groups_and_sorts() {
        let partner = User::new("Priya Shah", "priya@partner.example", Role::Partner);
        let u1 = User::new("Arun Mehta", "arun@example.com", Role::Normal)
            .recruited_by(partner.id.clone());
        let u2 = User::new("Zara Iqbal", "zara@example.com", Role::Normal)
            .recruited_by(partner.id.clone());

        let old = app_for(&u1, &u1, 48);
        let newer = app_for(&u1, &partner, 1);
        let other = app_for(&u2, &u2, 2);

        let projection = assemble(
            vec![u2.clone(), u1.clone()],
            vec![old.clone(), other, newer.clone()],
            vec![],
        );

        assert!(!projection.is_degraded());
        assert_eq!(projection.entries.len(), 2);
        assert_eq!(projection.application_count(), 3);

        // Entries sorted by client name: Arun before Zara.
        assert_eq!(projection.entries[0].client.id, u1.id);
        // Applications newest first.
        assert_eq!(projection.entries[0].applications[0].id, newer.id);
        assert_eq!(projection.entries[0].applications[1].id, old.id);
    }

    #[test]
    fn test_partner_filed_application_lands_under_applicant() {
        let partner = User::new("Priya Shah", "priya@partner.example", Role::Partner);
        let u1 = User::new("Arun Mehta", "arun@example.com", Role::Normal)
            .recruited_by(partner.id.clone());
        let u2 = User::new("Zara Iqbal", "zara@example.com", Role::Normal)
            .recruited_by(partner.id.clone());

        // Filed by the partner for u1; the applicant match must win even
        // though u2 is also a roster member.
        let filed = app_for(&u1, &partner, 0);

        let projection = assemble(vec![u1.clone(), u2], vec![filed], vec![]);
        let arun = projection
            .entries
            .iter()
            .find(|e| e.client.id == u1.id)
            .unwrap();
        assert_eq!(arun.applications.len(), 1);
    }

    #[test]
    fn test_degraded_flag() {
        let projection = assemble(vec![], vec![], vec![ServiceCategory::CaService]);
        assert!(projection.is_degraded());
        assert_eq!(projection.failed_categories, vec![ServiceCategory::CaService]);
    }
}
