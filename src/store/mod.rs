//! Record store used by the web layer and the job tracker.
//!
//! [`Store`] is the persistence boundary of the service. PostgreSQL
//! ([`DbConnection`](crate::db::connection::DbConnection)) is the production
//! implementation; [`memory::MemoryStore`] backs local runs without a
//! database and the test suites.

pub mod memory;
mod postgres;

use crate::models::job::{JobDb, JobUpdate};
use crate::models::user::UserDb;
use crate::prelude::*;

/// Fields needed to record a freshly submitted job.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub owner_id: i32,
    pub prompt: String,
    pub image_url: Option<String>,
    pub strength: Option<f64>,
    pub application: String,
    pub provider_request_id: Option<String>,
}

pub trait Store: Send + Sync {
    /// Creates a user. Fails with [`Error::EmailTaken`] on duplicates.
    fn create_user(&self, email: &str, hashed_password: &str) -> Result<UserDb>;

    fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserDb>>;

    /// Records a job with status `pending` and no poll attempts.
    fn create_job(&self, job: NewJob) -> Result<JobDb>;

    fn fetch_job(&self, id: i32) -> Result<Option<JobDb>>;

    /// Fetches a job only if it belongs to `owner_id`.
    fn fetch_job_for_owner(&self, id: i32, owner_id: i32) -> Result<Option<JobDb>>;

    /// Lists a user's jobs newest first. `page` starts at 1.
    fn list_jobs_for_owner(&self, owner_id: i32, page: i64, limit: i64) -> Result<Vec<JobDb>>;

    /// Applies `update` if it keeps the job lifecycle monotonic: terminal jobs
    /// are never changed and status changes only move forward.
    ///
    /// Returns `None` if the job is missing or the update was refused.
    fn update_job(&self, id: i32, update: &JobUpdate) -> Result<Option<JobDb>>;

    /// Jobs with a provider request id that are not terminal yet.
    fn fetch_unfinished_jobs(&self) -> Result<Vec<JobDb>>;
}
