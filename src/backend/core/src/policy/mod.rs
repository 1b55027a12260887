//! Role-scoped access policy.
//!
//! This module provides:
//! - **Operations**: the closed set of policy-gated portal operations
//! - **Policy Engine**: evaluates whether an actor may perform an operation
//!   on a target, with a fixed precedence order (admin override first)
//! - **Decisions**: `Allow` / `Deny(reason)` value types, convertible to a
//!   `Forbidden` error via `enforce`
//!
//! The engine is pure: it inspects only the actor and target records handed
//! to it, performs no I/O, and mutates nothing. `Forbidden` (policy denied)
//! is distinct from `NotFound` (target absent); the portal service resolves
//! targets before consulting the policy, so probing an absent record yields
//! `NotFound` and probing an inaccessible one yields `Forbidden`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use meridian_core::policy::{AccessTarget, Operation, PolicyEngine};
//!
//! let engine = PolicyEngine::new();
//! let decision = engine.check(
//!     &actor,
//!     Operation::ViewApplication,
//!     &AccessTarget::Application { application: &app, applicant: Some(&applicant) },
//! );
//! ```

mod engine;
mod operation;

pub use engine::{AccessTarget, PolicyDecision, PolicyEngine};
pub use operation::Operation;
