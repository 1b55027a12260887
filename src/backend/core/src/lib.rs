//! # Meridian Core
//!
//! Service core for the Meridian customer portal: end users and partner
//! intermediaries submit financial-services applications (loans, chartered
//! accountant services, government scheme loans), track their status, and
//! administrators review, approve, reassign, and remove them.
//!
//! ## Architecture
//!
//! - **Policy**: pure access-decision engine gating every operation
//! - **Applications**: application records, service categories, and the
//!   status lifecycle
//! - **Roster**: per-partner projection of clients and their applications
//! - **Portal**: the operation layer exposed to controllers
//! - **Store**: document-store port with an in-memory implementation
//! - **Notify**: transactional-email port and detached dispatch
//! - **Identity**: user/role model and session resolution
//! - **API**: axum HTTP surface over the portal service

pub mod api;
pub mod applications;
pub mod config;
pub mod error;
pub mod files;
pub mod identity;
pub mod notify;
pub mod policy;
pub mod portal;
pub mod roster;
pub mod store;
pub mod telemetry;

pub use error::{ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, MeridianError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::applications::{
        ApplicantDetails, Application, ApplicationId, ApplicationStatus, ServiceCategory,
        StatusChange, SubmittedBy,
    };
    pub use crate::error::{
        ErrorCode, ErrorContext, ErrorDetails, ErrorSeverity, MeridianError, Result,
    };
    pub use crate::files::{FileStore, UploadedFile};
    pub use crate::identity::{PartnerProfile, Role, SessionResolver, User, UserId};
    pub use crate::notify::{EmailMessage, EmailSender, NotificationDispatcher, StatusNotification};
    pub use crate::policy::{AccessTarget, Operation, PolicyDecision, PolicyEngine};
    pub use crate::portal::{
        ApplicationDraft, AttachmentDraft, ClientRemovalOutcome, PortalService,
    };
    pub use crate::roster::{ClientApplications, RosterProjection};
    pub use crate::store::{Collection, DocumentStore, Filter, InMemoryStore};
}
