//! In-memory record store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::models::job::{JobDb, JobUpdate};
use crate::models::job_status::JobStatus;
use crate::models::user::UserDb;
use crate::prelude::*;

use super::{NewJob, Store};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, UserDb>,
    jobs: BTreeMap<i32, JobDb>,
    next_user_id: i32,
    next_job_id: i32,
}

/// Volatile [`Store`] with serial ids, matching the PostgreSQL semantics.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave a half-written record.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Store for MemoryStore {
    fn create_user(&self, email: &str, hashed_password: &str) -> Result<UserDb> {
        let mut tables = self.tables();
        if tables.users.values().any(|user| user.email == email) {
            return Err(Error::EmailTaken);
        }
        tables.next_user_id += 1;
        let now = Utc::now();
        let user = UserDb {
            id: tables.next_user_id,
            email: String::from(email),
            hashed_password: String::from(hashed_password),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserDb>> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    fn create_job(&self, job: NewJob) -> Result<JobDb> {
        let mut tables = self.tables();
        tables.next_job_id += 1;
        let now = Utc::now();
        let job = JobDb {
            id: tables.next_job_id,
            owner_id: job.owner_id,
            prompt: job.prompt,
            image_url: job.image_url,
            strength: job.strength,
            application: job.application,
            provider_request_id: job.provider_request_id,
            status: JobStatus::Pending,
            result_url: None,
            description: None,
            error: None,
            poll_attempts: 0,
            created_at: now,
            updated_at: now,
        };
        tables.jobs.insert(job.id, job.clone());
        Ok(job)
    }

    fn fetch_job(&self, id: i32) -> Result<Option<JobDb>> {
        Ok(self.tables().jobs.get(&id).cloned())
    }

    fn fetch_job_for_owner(&self, id: i32, owner_id: i32) -> Result<Option<JobDb>> {
        Ok(self
            .tables()
            .jobs
            .get(&id)
            .filter(|job| job.owner_id == owner_id)
            .cloned())
    }

    fn list_jobs_for_owner(&self, owner_id: i32, page: i64, limit: i64) -> Result<Vec<JobDb>> {
        // Pages past the addressable range are empty.
        let Some(skip) = (page - 1)
            .max(0)
            .checked_mul(limit)
            .and_then(|skip| usize::try_from(skip).ok())
        else {
            return Ok(Vec::new());
        };
        let take = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .tables()
            .jobs
            .values()
            .rev()
            .filter(|job| job.owner_id == owner_id)
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    fn update_job(&self, id: i32, update: &JobUpdate) -> Result<Option<JobDb>> {
        let mut tables = self.tables();
        Ok(tables
            .jobs
            .get_mut(&id)
            .and_then(|job| job.merge(update).then(|| job.clone())))
    }

    fn fetch_unfinished_jobs(&self) -> Result<Vec<JobDb>> {
        Ok(self
            .tables()
            .jobs
            .values()
            .filter(|job| !job.status.is_terminal() && job.provider_request_id.is_some())
            .cloned()
            .collect())
    }
}
