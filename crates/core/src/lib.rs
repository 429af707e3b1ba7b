//! Attendance, penalty and eligibility engine for volunteer-hub.
//!
//! Services take store handles from `hub_db::repositories` and an
//! [`EscalationPolicy`] built from the `engine` configuration section.

pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use services::*;
