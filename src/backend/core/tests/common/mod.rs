//! Shared test harness: an in-memory portal wired to a recording email
//! sender, plus seeding helpers and failure-injecting doubles.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use meridian_core::files::InMemoryFileStore;
use meridian_core::notify::RecordingSender;
use meridian_core::prelude::*;

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub sender: Arc<RecordingSender>,
    pub portal: PortalService,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let sender = Arc::new(RecordingSender::new());
    let portal = PortalService::new(
        store.clone(),
        Arc::new(InMemoryFileStore::new("http://localhost:8080/files")),
        NotificationDispatcher::new(sender.clone()),
    );
    Harness {
        store,
        sender,
        portal,
    }
}

/// Portal over an arbitrary store, still recording notifications.
pub fn portal_over(store: Arc<dyn DocumentStore>) -> (PortalService, Arc<RecordingSender>) {
    let sender = Arc::new(RecordingSender::new());
    let portal = PortalService::new(
        store,
        Arc::new(InMemoryFileStore::new("http://localhost:8080/files")),
        NotificationDispatcher::new(sender.clone()),
    );
    (portal, sender)
}

pub async fn seed_user(store: &dyn DocumentStore, user: &User) {
    store
        .set(
            Collection::Users,
            user.id.as_str(),
            serde_json::to_value(user).unwrap(),
        )
        .await
        .unwrap();
}

pub async fn seed_approved_partner(store: &dyn DocumentStore, user: &User, company: &str) {
    seed_user(store, user).await;
    let profile = PartnerProfile::new(user.id.clone(), company).approved();
    store
        .set(
            Collection::Partners,
            user.id.as_str(),
            serde_json::to_value(&profile).unwrap(),
        )
        .await
        .unwrap();
}

pub async fn seed_application(store: &dyn DocumentStore, application: &Application) {
    store
        .set(
            application.service_category.collection(),
            application.id.as_str(),
            serde_json::to_value(application).unwrap(),
        )
        .await
        .unwrap();
}

pub fn application(
    category: ServiceCategory,
    applicant: &User,
    submitter: &User,
) -> Application {
    Application::new(
        category,
        "home_loan",
        ApplicantDetails::of(applicant),
        SubmittedBy::of(submitter),
        serde_json::json!({ "amount": 100000 }),
    )
}

/// Poll the recording sender until a message arrives or the deadline passes.
pub async fn wait_for_messages(sender: &RecordingSender, expected: usize) -> Vec<EmailMessage> {
    for _ in 0..100 {
        let sent = sender.sent();
        if sent.len() >= expected {
            return sent;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    sender.sent()
}

/// Store wrapper that fails every query against one collection.
pub struct FlakyStore {
    inner: Arc<InMemoryStore>,
    failing: Collection,
}

impl FlakyStore {
    pub fn new(inner: Arc<InMemoryStore>, failing: Collection) -> Self {
        Self { inner, failing }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>> {
        self.inner.get(collection, id).await
    }

    async fn query(&self, collection: Collection, filter: &Filter) -> Result<Vec<Value>> {
        if collection == self.failing {
            return Err(MeridianError::store(format!(
                "simulated outage for {}",
                collection
            )));
        }
        self.inner.query(collection, filter).await
    }

    async fn set(&self, collection: Collection, id: &str, patch: Value) -> Result<()> {
        self.inner.set(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool> {
        self.inner.delete(collection, id).await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// Email sender that always fails.
pub struct FailingSender;

#[async_trait]
impl EmailSender for FailingSender {
    async fn send(&self, _message: &EmailMessage) -> Result<()> {
        Err(MeridianError::with_internal(
            meridian_core::ErrorCode::EmailDispatchFailed,
            "Email provider request failed",
            "simulated provider outage",
        ))
    }

    fn name(&self) -> &str {
        "failing"
    }
}
