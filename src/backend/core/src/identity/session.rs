//! Session-token resolution.
//!
//! Tokens are opaque: the portal never mints or validates them beyond asking
//! the resolver. Tokens are stored and logged only as SHA-256 fingerprints.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

use super::{User, UserId};
use crate::error::Result;
use crate::store::{Collection, DocumentStore};

/// Hex-encoded SHA-256 fingerprint of a session token.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Resolves an opaque session token to a user record.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Returns `None` when the token is unknown or the user no longer exists.
    async fn resolve(&self, token: &str) -> Result<Option<User>>;
}

/// Session record persisted in the `sessions` collection, keyed by token
/// fingerprint.
#[derive(Debug, Deserialize)]
struct SessionRecord {
    user_id: UserId,
}

/// Session resolver backed by the document store.
pub struct StoreSessionResolver {
    store: Arc<dyn DocumentStore>,
}

impl StoreSessionResolver {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Register a session token for a user. Used by bootstrap seeding and
    /// tests; production sessions come from the auth provider.
    pub async fn register(&self, token: &str, user_id: &UserId) -> Result<()> {
        let fingerprint = token_fingerprint(token);
        self.store
            .set(
                Collection::Sessions,
                &fingerprint,
                json!({
                    "user_id": user_id,
                    "created_at": Utc::now(),
                }),
            )
            .await?;
        debug!(token_fingerprint = %fingerprint, user_id = %user_id, "Session registered");
        Ok(())
    }
}

#[async_trait]
impl SessionResolver for StoreSessionResolver {
    async fn resolve(&self, token: &str) -> Result<Option<User>> {
        let fingerprint = token_fingerprint(token);

        let Some(doc) = self.store.get(Collection::Sessions, &fingerprint).await? else {
            debug!(token_fingerprint = %fingerprint, "Unknown session token");
            return Ok(None);
        };
        let session: SessionRecord = serde_json::from_value(doc)?;

        let Some(user_doc) = self
            .store
            .get(Collection::Users, session.user_id.as_str())
            .await?
        else {
            debug!(user_id = %session.user_id, "Session user no longer exists");
            return Ok(None);
        };

        Ok(Some(serde_json::from_value(user_doc)?))
    }
}
