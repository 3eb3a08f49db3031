use crate::db::connection::DbConnection;
use crate::models::job::{JobCreate, JobDb, JobUpdate};
use crate::models::user::{UserCreate, UserDb};
use crate::prelude::*;

use super::{NewJob, Store};

impl From<NewJob> for JobCreate {
    fn from(value: NewJob) -> Self {
        Self {
            owner_id: value.owner_id,
            prompt: value.prompt,
            image_url: value.image_url,
            strength: value.strength,
            application: value.application,
            provider_request_id: value.provider_request_id,
        }
    }
}

impl Store for DbConnection {
    fn create_user(&self, email: &str, hashed_password: &str) -> Result<UserDb> {
        UserCreate {
            email: String::from(email),
            hashed_password: String::from(hashed_password),
        }
        .save(self)
    }

    fn fetch_user_by_email(&self, email: &str) -> Result<Option<UserDb>> {
        UserDb::fetch_by_email(email, self)
    }

    fn create_job(&self, job: NewJob) -> Result<JobDb> {
        JobCreate::from(job).save(self)
    }

    fn fetch_job(&self, id: i32) -> Result<Option<JobDb>> {
        JobDb::fetch_by_id(id, self)
    }

    fn fetch_job_for_owner(&self, id: i32, owner_id: i32) -> Result<Option<JobDb>> {
        JobDb::fetch_for_owner(id, owner_id, self)
    }

    fn list_jobs_for_owner(&self, owner_id: i32, page: i64, limit: i64) -> Result<Vec<JobDb>> {
        JobDb::fetch_page_for_owner(owner_id, page, limit, self)
    }

    fn update_job(&self, id: i32, update: &JobUpdate) -> Result<Option<JobDb>> {
        JobDb::apply(id, update, self)
    }

    fn fetch_unfinished_jobs(&self) -> Result<Vec<JobDb>> {
        JobDb::fetch_unfinished(self)
    }
}
