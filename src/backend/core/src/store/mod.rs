//! Document store port.
//!
//! The portal persists everything through this seam: a hosted document
//! database in production, [`InMemoryStore`] in development and tests.
//! Documents are JSON objects; `set` is a shallow merge-patch so callers can
//! update a single field (including setting it to `null`) without rewriting
//! the record. Single-document writes are atomic; nothing here provides
//! cross-document transactions.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::error::Result;

// ═══════════════════════════════════════════════════════════════════════════════
// Collections
// ═══════════════════════════════════════════════════════════════════════════════

/// Logical collections. Application collections are addressed through the
/// pure `ServiceCategory::collection()` mapping, never by string matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Partners,
    Sessions,
    LoanApplications,
    CaServiceApplications,
    GovernmentSchemeApplications,
}

impl Collection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Partners => "partners",
            Self::Sessions => "sessions",
            Self::LoanApplications => "loan_applications",
            Self::CaServiceApplications => "ca_service_applications",
            Self::GovernmentSchemeApplications => "government_scheme_applications",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Filters
// ═══════════════════════════════════════════════════════════════════════════════

/// Query filter evaluated against JSON documents. Field paths are dotted
/// (`"applicant_details.user_id"`).
#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field equals any of the values.
    AnyOf { field: String, values: Vec<Value> },
    /// All sub-filters match.
    And(Vec<Filter>),
    /// Any sub-filter matches.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn any_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::AnyOf {
            field: field.into(),
            values,
        }
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    /// Evaluate this filter against a document.
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => lookup_path(doc, field) == Some(value),
            Self::AnyOf { field, values } => lookup_path(doc, field)
                .map(|found| values.iter().any(|v| v == found))
                .unwrap_or(false),
            Self::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}

/// Resolve a dotted field path inside a JSON object.
fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Document Store Trait
// ═══════════════════════════════════════════════════════════════════════════════

/// Trait for document store backends.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get a document by id.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>>;

    /// Query a collection for all documents matching the filter.
    async fn query(&self, collection: Collection, filter: &Filter) -> Result<Vec<Value>>;

    /// Upsert a document. When a document already exists, top-level keys of
    /// `patch` are merged into it; explicit `null` values overwrite.
    async fn set(&self, collection: Collection, id: &str, patch: Value) -> Result<()>;

    /// Delete a document. Returns `false` when the id was absent.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool>;

    /// Get the backend name.
    fn name(&self) -> &'static str;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_eq_dotted_path() {
        let doc = json!({
            "applicant_details": { "user_id": "u1", "email": "arun@example.com" },
            "status": "Submitted",
        });

        assert!(Filter::eq("status", "Submitted").matches(&doc));
        assert!(Filter::eq("applicant_details.user_id", "u1").matches(&doc));
        assert!(!Filter::eq("applicant_details.user_id", "u2").matches(&doc));
        assert!(!Filter::eq("missing.path", "x").matches(&doc));
    }

    #[test]
    fn test_filter_any_of_and_or() {
        let doc = json!({ "submitted_by": { "user_id": "p1" }, "status": "Approved" });

        let members = Filter::any_of(
            "submitted_by.user_id",
            vec![json!("u1"), json!("p1")],
        );
        assert!(members.matches(&doc));

        let either = Filter::or(vec![
            Filter::eq("status", "Rejected"),
            Filter::eq("status", "Approved"),
        ]);
        assert!(either.matches(&doc));

        let both = Filter::and(vec![either, Filter::eq("submitted_by.user_id", "p2")]);
        assert!(!both.matches(&doc));
    }

    #[test]
    fn test_filter_null_equality() {
        let doc = json!({ "partner_id": null });
        assert!(Filter::eq("partner_id", Value::Null).matches(&doc));
        assert!(!Filter::eq("partner_id", "p1").matches(&doc));
    }
}
