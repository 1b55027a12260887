//! Portal operation layer.
//!
//! `PortalService` is what controllers call: it resolves records through the
//! document store, consults the policy engine, applies the mutation, and
//! hands status changes to the notification dispatcher. Resolution happens
//! before the policy check, so an absent record is `NotFound` while an
//! existing but inaccessible one is `Forbidden`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::applications::{
    ApplicantDetails, Application, ApplicationId, ApplicationStatus, ServiceCategory,
    StatusChange, SubmittedBy,
};
use crate::error::{MeridianError, Result};
use crate::files::{parse_data_uri, FileStore};
use crate::identity::{PartnerProfile, Role, User, UserId};
use crate::notify::{NotificationDispatcher, StatusNotification};
use crate::policy::{AccessTarget, Operation, PolicyEngine};
use crate::roster::{self, ClientApplications, RosterProjection};
use crate::store::{Collection, DocumentStore, Filter};

// ═══════════════════════════════════════════════════════════════════════════════
// Inputs and Outcomes
// ═══════════════════════════════════════════════════════════════════════════════

/// Inline attachment on a submission, carried as a `data:` URI.
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentDraft {
    /// Form field the resulting URL is stored under.
    pub field: String,
    pub filename: String,
    pub data_uri: String,
}

/// A new application as received from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationDraft {
    pub service_category: ServiceCategory,
    pub application_type: String,
    /// Applicant user id; omitted means the actor applies for themselves.
    #[serde(default)]
    pub applicant_user_id: Option<UserId>,
    pub form_data: Value,
    #[serde(default)]
    pub attachments: Vec<AttachmentDraft>,
}

/// Result of the permanent-delete cascade.
#[derive(Debug, Clone, Serialize)]
pub struct ClientRemovalOutcome {
    pub client_id: UserId,
    pub applications_reassigned: usize,
    pub applications_deleted: usize,
    /// Applications whose cascade step failed after a retry. The user record
    /// is gone; these need manual reconciliation.
    pub reconciliation_required: Vec<ApplicationId>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Portal Service
// ═══════════════════════════════════════════════════════════════════════════════

/// The operation layer over store, policy, files, and notifications.
#[derive(Clone)]
pub struct PortalService {
    store: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
    policy: PolicyEngine,
    notifications: NotificationDispatcher,
}

impl PortalService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        files: Arc<dyn FileStore>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            store,
            files,
            policy: PolicyEngine::new(),
            notifications,
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Applications
    // ───────────────────────────────────────────────────────────────────────────

    /// Read a single application, policy-gated.
    pub async fn view_application(
        &self,
        actor: &User,
        category: ServiceCategory,
        id: &ApplicationId,
    ) -> Result<Application> {
        let application = self.require_application(category, id).await?;
        let applicant = match &application.applicant_details.user_id {
            Some(user_id) => self.load_user(user_id).await?,
            None => None,
        };
        self.policy.enforce(
            actor,
            Operation::ViewApplication,
            &AccessTarget::Application {
                application: &application,
                applicant: applicant.as_ref(),
            },
        )?;
        Ok(application)
    }

    /// Submit a new application, uploading inline attachments first.
    pub async fn submit_application(
        &self,
        actor: &User,
        draft: ApplicationDraft,
    ) -> Result<Application> {
        let applicant = match &draft.applicant_user_id {
            Some(user_id) if user_id != &actor.id => {
                let applicant = self.require_user(user_id).await?;
                let allowed = actor.is_admin()
                    || (actor.is_partner() && actor.has_client(&applicant));
                if !allowed {
                    return Err(MeridianError::forbidden(format!(
                        "user {} may not submit applications for {}",
                        actor.id, applicant.id
                    )));
                }
                applicant
            }
            _ => actor.clone(),
        };

        let mut form_data = match draft.form_data {
            Value::Object(map) => map,
            _ => return Err(MeridianError::validation("form_data must be a JSON object")),
        };

        for attachment in &draft.attachments {
            let parsed = parse_data_uri(&attachment.data_uri)?;
            let uploaded = self
                .files
                .put(&attachment.filename, &parsed.content_type, parsed.bytes)
                .await?;
            form_data.insert(attachment.field.clone(), json!(uploaded.url));
        }

        let managing_partner = if actor.is_partner() && applicant.id != actor.id {
            Some(actor.id.clone())
        } else {
            None
        };

        let mut application = Application::new(
            draft.service_category,
            draft.application_type,
            ApplicantDetails::of(&applicant),
            SubmittedBy::of(actor),
            Value::Object(form_data),
        );
        application.partner_id = managing_partner;

        self.store
            .set(
                application.service_category.collection(),
                application.id.as_str(),
                serde_json::to_value(&application)?,
            )
            .await?;

        info!(
            application_id = %application.id,
            category = %application.service_category.collection(),
            submitted_by = %actor.id,
            "Application submitted"
        );
        Ok(application)
    }

    /// Admin status transition. Persists the new status, then dispatches a
    /// notification on a detached task; dispatch failure never surfaces here.
    pub async fn update_application_status(
        &self,
        actor: &User,
        category: ServiceCategory,
        id: &ApplicationId,
        new_status: ApplicationStatus,
        message: Option<String>,
    ) -> Result<StatusChange> {
        let application = self.require_application(category, id).await?;
        self.policy.enforce(
            actor,
            Operation::UpdateApplicationStatus,
            &AccessTarget::Application {
                application: &application,
                applicant: None,
            },
        )?;

        if !application.status.is_standard_transition(&new_status) {
            warn!(
                application_id = %id,
                from = %application.status,
                to = %new_status,
                "Non-standard status transition"
            );
        }

        self.store
            .set(
                category.collection(),
                id.as_str(),
                json!({ "status": new_status }),
            )
            .await?;

        let change = StatusChange {
            application_id: id.clone(),
            service_category: category,
            application_type: application.application_type.clone(),
            from: application.status,
            to: new_status,
            message,
            changed_by: actor.id.clone(),
            changed_at: chrono::Utc::now(),
        };

        let recipients = vec![
            application.applicant_details.email.clone(),
            application.submitted_by.user_email.clone(),
        ];
        self.notifications
            .dispatch(StatusNotification::new(change.clone(), recipients));

        info!(
            application_id = %id,
            from = %change.from,
            to = %change.to,
            changed_by = %actor.id,
            "Application status updated"
        );
        Ok(change)
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Roster
    // ───────────────────────────────────────────────────────────────────────────

    /// Per-partner projection of clients and their applications. A failed
    /// category query degrades the projection instead of aborting it.
    pub async fn view_client_roster(&self, actor: &User) -> Result<RosterProjection> {
        self.policy
            .enforce(actor, Operation::ViewClientRoster, &AccessTarget::PartnerScope)?;

        let client_docs = self
            .store
            .query(
                Collection::Users,
                &Filter::eq("partner_id", actor.id.as_str()),
            )
            .await?;
        let clients: Vec<User> = client_docs
            .into_iter()
            .filter_map(|doc| decode_or_warn(doc, Collection::Users))
            .collect();

        let member_ids: Vec<Value> = clients
            .iter()
            .map(|c| json!(c.id.as_str()))
            .collect();
        let involves_member = Filter::or(vec![
            Filter::any_of("applicant_details.user_id", member_ids.clone()),
            Filter::any_of("submitted_by.user_id", member_ids),
        ]);

        let mut applications = Vec::new();
        let mut failed_categories = Vec::new();
        if !clients.is_empty() {
            for category in ServiceCategory::ALL {
                match self
                    .store
                    .query(category.collection(), &involves_member)
                    .await
                {
                    Ok(docs) => applications.extend(
                        docs.into_iter()
                            .filter_map(|doc| decode_or_warn(doc, category.collection())),
                    ),
                    Err(error) => {
                        warn!(
                            category = %category.collection(),
                            partner = %actor.id,
                            %error,
                            "Roster category query failed; returning degraded projection"
                        );
                        failed_categories.push(category);
                    }
                }
            }
        }

        Ok(roster::assemble(clients, applications, failed_categories))
    }

    /// Single roster client with their applications.
    pub async fn view_client_detail(
        &self,
        actor: &User,
        client_id: &UserId,
    ) -> Result<ClientApplications> {
        let client = self.require_user(client_id).await?;
        self.policy
            .enforce(actor, Operation::ViewClientDetail, &AccessTarget::Client(&client))?;

        let mut applications = self.applications_involving(client_id).await?;
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ClientApplications {
            client,
            applications,
        })
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Client management
    // ───────────────────────────────────────────────────────────────────────────

    /// Sever the roster linkage. The user record and their applications are
    /// otherwise untouched.
    pub async fn disassociate_client(&self, actor: &User, client_id: &UserId) -> Result<User> {
        let mut client = self.require_user(client_id).await?;
        self.policy.enforce(
            actor,
            Operation::DisassociateClient,
            &AccessTarget::Client(&client),
        )?;

        self.store
            .set(
                Collection::Users,
                client_id.as_str(),
                json!({ "partner_id": null }),
            )
            .await?;
        client.partner_id = None;

        info!(client = %client_id, by = %actor.id, "Client disassociated");
        Ok(client)
    }

    /// Move a client onto another partner's roster. Admin only; the target
    /// must be an approved partner.
    pub async fn reassign_client(
        &self,
        actor: &User,
        client_id: &UserId,
        new_partner_id: &UserId,
    ) -> Result<User> {
        let mut client = self.require_user(client_id).await?;
        self.policy.enforce(
            actor,
            Operation::ReassignClient,
            &AccessTarget::Client(&client),
        )?;
        self.require_approved_partner(new_partner_id).await?;

        self.store
            .set(
                Collection::Users,
                client_id.as_str(),
                json!({ "partner_id": new_partner_id }),
            )
            .await?;
        client.partner_id = Some(new_partner_id.clone());

        info!(
            client = %client_id,
            new_partner = %new_partner_id,
            by = %actor.id,
            "Client reassigned"
        );
        Ok(client)
    }

    /// Delete the client record and cascade over their applications. The
    /// cascade is non-atomic: once the user record is deleted the operation
    /// succeeds, and any application step that fails after a retry is
    /// reported back for reconciliation instead of failing the call.
    pub async fn permanently_delete_client(
        &self,
        actor: &User,
        client_id: &UserId,
        reassign_to: Option<UserId>,
    ) -> Result<ClientRemovalOutcome> {
        let client = self.require_user(client_id).await?;
        self.policy.enforce(
            actor,
            Operation::PermanentlyDeleteClient,
            &AccessTarget::Client(&client),
        )?;
        if let Some(target) = &reassign_to {
            self.require_approved_partner(target).await?;
        }

        // Everything before the user delete can still abort the operation.
        let applications = self.applications_involving(client_id).await?;

        // Commit point.
        self.store
            .delete(Collection::Users, client_id.as_str())
            .await?;

        let mut outcome = ClientRemovalOutcome {
            client_id: client_id.clone(),
            applications_reassigned: 0,
            applications_deleted: 0,
            reconciliation_required: Vec::new(),
        };

        for application in &applications {
            let result = self
                .cascade_step(application, reassign_to.as_ref())
                .await;
            let result = match result {
                Ok(()) => Ok(()),
                Err(first) => {
                    warn!(
                        application_id = %application.id,
                        error = %first,
                        "Cascade step failed; retrying once"
                    );
                    self.cascade_step(application, reassign_to.as_ref()).await
                }
            };
            match result {
                Ok(()) if reassign_to.is_some() => outcome.applications_reassigned += 1,
                Ok(()) => outcome.applications_deleted += 1,
                Err(error) => {
                    warn!(
                        application_id = %application.id,
                        category = %application.service_category.collection(),
                        %error,
                        "Cascade step failed after retry; reconciliation required"
                    );
                    outcome.reconciliation_required.push(application.id.clone());
                }
            }
        }

        info!(
            client = %client_id,
            by = %actor.id,
            reassigned = outcome.applications_reassigned,
            deleted = outcome.applications_deleted,
            pending = outcome.reconciliation_required.len(),
            "Client permanently removed"
        );
        Ok(outcome)
    }

    async fn cascade_step(
        &self,
        application: &Application,
        reassign_to: Option<&UserId>,
    ) -> Result<()> {
        let collection = application.service_category.collection();
        match reassign_to {
            Some(partner_id) => {
                self.store
                    .set(
                        collection,
                        application.id.as_str(),
                        json!({ "partner_id": partner_id }),
                    )
                    .await
            }
            None => {
                self.store
                    .delete(collection, application.id.as_str())
                    .await
                    .map(|_| ())
            }
        }
    }

    // ───────────────────────────────────────────────────────────────────────────
    // Resolution helpers
    // ───────────────────────────────────────────────────────────────────────────

    pub async fn load_user(&self, id: &UserId) -> Result<Option<User>> {
        let doc = self.store.get(Collection::Users, id.as_str()).await?;
        doc.map(|d| serde_json::from_value(d).map_err(Into::into))
            .transpose()
    }

    async fn require_user(&self, id: &UserId) -> Result<User> {
        self.load_user(id)
            .await?
            .ok_or_else(|| MeridianError::not_found("user", id.as_str()))
    }

    async fn require_application(
        &self,
        category: ServiceCategory,
        id: &ApplicationId,
    ) -> Result<Application> {
        let doc = self.store.get(category.collection(), id.as_str()).await?;
        match doc {
            Some(d) => Ok(serde_json::from_value(d)?),
            None => Err(MeridianError::not_found("application", id.as_str())),
        }
    }

    async fn applications_involving(&self, user_id: &UserId) -> Result<Vec<Application>> {
        let involves = Filter::or(vec![
            Filter::eq("applicant_details.user_id", user_id.as_str()),
            Filter::eq("submitted_by.user_id", user_id.as_str()),
        ]);
        let mut applications = Vec::new();
        for category in ServiceCategory::ALL {
            let docs = self.store.query(category.collection(), &involves).await?;
            applications.extend(
                docs.into_iter()
                    .filter_map(|doc| decode_or_warn(doc, category.collection())),
            );
        }
        Ok(applications)
    }

    async fn require_approved_partner(&self, partner_id: &UserId) -> Result<()> {
        let user = match self.load_user(partner_id).await? {
            Some(user) => user,
            None => {
                return Err(MeridianError::validation(format!(
                    "reassignment target {} does not exist",
                    partner_id
                )))
            }
        };
        if user.role != Role::Partner {
            return Err(MeridianError::validation(format!(
                "reassignment target {} is not a partner account",
                partner_id
            )));
        }
        let profile: Option<PartnerProfile> = self
            .store
            .get(Collection::Partners, partner_id.as_str())
            .await?
            .map(serde_json::from_value)
            .transpose()?;
        match profile {
            Some(profile) if profile.approved => Ok(()),
            _ => Err(MeridianError::validation(format!(
                "reassignment target {} is not an approved partner",
                partner_id
            ))),
        }
    }
}

/// Deserialize a stored document, logging and skipping records that no
/// longer match the model instead of failing the whole read.
fn decode_or_warn<T: serde::de::DeserializeOwned>(doc: Value, collection: Collection) -> Option<T> {
    match serde_json::from_value(doc) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(%collection, %error, "Skipping undecodable document");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::InMemoryFileStore;
    use crate::notify::RecordingSender;
    use crate::store::InMemoryStore;

    async fn service_with_store() -> (PortalService, Arc<InMemoryStore>, Arc<RecordingSender>) {
        let store = Arc::new(InMemoryStore::new());
        let files = Arc::new(InMemoryFileStore::new("http://localhost:8080/files"));
        let sender = Arc::new(RecordingSender::new());
        let service = PortalService::new(
            store.clone(),
            files,
            NotificationDispatcher::new(sender.clone()),
        );
        (service, store, sender)
    }

    async fn seed_user(store: &InMemoryStore, user: &User) {
        store
            .set(
                Collection::Users,
                user.id.as_str(),
                serde_json::to_value(user).unwrap(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submission_splices_attachment_urls() {
        let (service, _store, _) = service_with_store().await;
        let actor = User::new("Arun Mehta", "arun@example.com", Role::Normal);

        let draft = ApplicationDraft {
            service_category: ServiceCategory::Loan,
            application_type: "home_loan".to_string(),
            applicant_user_id: None,
            form_data: json!({ "amount": 250000 }),
            attachments: vec![AttachmentDraft {
                field: "income_proof".to_string(),
                filename: "statement.pdf".to_string(),
                data_uri: "data:application/pdf;base64,JVBERi0xLjQ=".to_string(),
            }],
        };

        let application = service.submit_application(&actor, draft).await.unwrap();
        assert_eq!(application.status, ApplicationStatus::Submitted);
        let url = application.form_data["income_proof"].as_str().unwrap();
        assert!(url.starts_with("http://localhost:8080/files/"));
        assert!(application.partner_id.is_none());
    }

    #[tokio::test]
    async fn test_partner_submission_for_stranger_forbidden() {
        let (service, store, _) = service_with_store().await;
        let partner = User::new("Priya Shah", "priya@partner.example", Role::Partner);
        let stranger = User::new("Noor Ali", "noor@example.com", Role::Normal);
        seed_user(&store, &stranger).await;

        let draft = ApplicationDraft {
            service_category: ServiceCategory::Loan,
            application_type: "home_loan".to_string(),
            applicant_user_id: Some(stranger.id.clone()),
            form_data: json!({}),
            attachments: vec![],
        };

        let err = service.submit_application(&partner, draft).await.unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_partner_submission_for_client_sets_managing_partner() {
        let (service, store, _) = service_with_store().await;
        let partner = User::new("Priya Shah", "priya@partner.example", Role::Partner);
        let client = User::new("Arun Mehta", "arun@example.com", Role::Normal)
            .recruited_by(partner.id.clone());
        seed_user(&store, &client).await;

        let draft = ApplicationDraft {
            service_category: ServiceCategory::CaService,
            application_type: "tax_filing".to_string(),
            applicant_user_id: Some(client.id.clone()),
            form_data: json!({}),
            attachments: vec![],
        };

        let application = service.submit_application(&partner, draft).await.unwrap();
        assert_eq!(application.partner_id, Some(partner.id.clone()));
        assert_eq!(application.applicant_details.user_id, Some(client.id));
        assert_eq!(application.submitted_by.user_id, partner.id);
    }

    #[tokio::test]
    async fn test_reassign_requires_approved_partner() {
        let (service, store, _) = service_with_store().await;
        let admin = User::new("Ida Admin", "ida@meridian.example", Role::Admin);
        let partner = User::new("Priya Shah", "priya@partner.example", Role::Partner);
        let unapproved = User::new("Omar Khan", "omar@partner.example", Role::Partner);
        let client = User::new("Arun Mehta", "arun@example.com", Role::Normal)
            .recruited_by(partner.id.clone());
        seed_user(&store, &partner).await;
        seed_user(&store, &unapproved).await;
        seed_user(&store, &client).await;

        // No partners-collection profile at all for `unapproved`.
        let err = service
            .reassign_client(&admin, &client.id, &unapproved.id)
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_view_application_not_found_before_policy() {
        let (service, _store, _) = service_with_store().await;
        let stranger = User::new("Noor Ali", "noor@example.com", Role::Normal);

        let err = service
            .view_application(&stranger, ServiceCategory::Loan, &ApplicationId::generate())
            .await
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::RecordNotFound);
    }
}
