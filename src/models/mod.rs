//! Database models.
//!
//! Diesel records for users and their jobs, plus the job status type shared
//! by every layer of the service.

pub mod job;
pub mod job_status;
pub mod user;
