//! Admission control
//!
//! Fixed-window quota tracking and the check/wait entry points callers use
//! before issuing an outbound request.

mod controller;
mod quota;
mod types;


pub use controller::AdmissionController;
pub use quota::QuotaTracker;
pub use types::{AdmissionDecision, QuotaStatus, WindowStatus};
