//! Task lifecycle and time-delayed escalation.
//!
//! Tasks are raised by domain collaborators and stay addressed to their
//! direct audience; visibility widens to supervising coordinators and then
//! to staff only after a configurable number of business days has passed.

mod scheduler;
mod store;
pub mod workdays;

pub use scheduler::EscalationScheduler;
pub use store::{NewTask, TaskStore};
