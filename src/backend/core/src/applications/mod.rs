//! Application records and their status lifecycle.

mod lifecycle;
mod model;

pub use lifecycle::StatusChange;
pub use model::{
    ApplicantDetails, Application, ApplicationId, ApplicationStatus, ServiceCategory, SubmittedBy,
};
