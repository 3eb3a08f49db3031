//! Job model for image generation requests tracked against the provider.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::connection::DbConnection;
use crate::models::job_status::JobStatus;
use crate::prelude::*;
use crate::schema::jobs::dsl::*;

/// A generation or edit request submitted on behalf of a user.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobDb {
    /// Unique job ID.
    pub id: i32,
    /// The user that submitted the job.
    pub owner_id: i32,
    /// Generation prompt or edit instructions.
    pub prompt: String,
    /// Source image as a data URL, only set for edits.
    pub image_url: Option<String>,
    /// Requested edit strength, only set for edits.
    pub strength: Option<f64>,
    /// Provider application id the job was submitted to.
    pub application: String,
    /// Request id handed out by the provider queue.
    pub provider_request_id: Option<String>,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// URL of the generated image once completed.
    pub result_url: Option<String>,
    /// Text the provider returned alongside the image.
    pub description: Option<String>,
    /// Failure reason.
    pub error: Option<String>,
    /// Number of background reconciliation rounds performed.
    pub poll_attempts: i32,
    /// When this job was created.
    pub created_at: DateTime<Utc>,
    /// When this job was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new job.
#[derive(Insertable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::jobs)]
pub struct JobCreate {
    pub owner_id: i32,
    pub prompt: String,
    pub image_url: Option<String>,
    pub strength: Option<f64>,
    pub application: String,
    pub provider_request_id: Option<String>,
}

/// Partial update of a job. `None` fields are left untouched.
#[derive(AsChangeset, PartialEq, Debug, Clone, Default)]
#[diesel(table_name = crate::schema::jobs)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub result_url: Option<String>,
    pub description: Option<String>,
    pub error: Option<String>,
    pub poll_attempts: Option<i32>,
}

impl JobCreate {
    /// Saves the job to the database with status `pending`.
    pub fn save(self, connection: &DbConnection) -> Result<JobDb> {
        let conn = &mut connection.pool.get()?;
        Ok(diesel::insert_into(jobs)
            .values(&self)
            .returning(JobDb::as_returning())
            .get_result(conn)?)
    }
}

impl JobUpdate {
    /// Statuses a job must not be in for this update to apply.
    ///
    /// Terminal jobs are never touched, and a status change is refused
    /// unless it moves the job forward.
    pub fn blocked_statuses(&self) -> Vec<JobStatus> {
        match self.status {
            Some(next) => JobStatus::ALL
                .into_iter()
                .filter(|current| !current.can_transition_to(next))
                .collect(),
            None => JobStatus::TERMINAL.to_vec(),
        }
    }
}

impl JobDb {
    pub fn fetch_by_id(target: i32, connection: &DbConnection) -> Result<Option<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(JobDb::by_id(target)
            .select(JobDb::as_select())
            .get_result(conn)
            .optional()?)
    }

    pub fn fetch_for_owner(
        target: i32,
        owner: i32,
        connection: &DbConnection,
    ) -> Result<Option<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(JobDb::by_id_and_owner(target, owner)
            .select(JobDb::as_select())
            .get_result(conn)
            .optional()?)
    }

    /// Fetches one page of a user's jobs, newest first. `page` starts at 1.
    pub fn fetch_page_for_owner(
        owner: i32,
        page: i64,
        limit: i64,
        connection: &DbConnection,
    ) -> Result<Vec<Self>> {
        let Some(skip) = (page - 1).max(0).checked_mul(limit) else {
            return Ok(Vec::new());
        };
        let conn = &mut connection.pool.get()?;
        Ok(JobDb::by_owner(owner)
            .order(id.desc())
            .offset(skip)
            .limit(limit)
            .select(JobDb::as_select())
            .load(conn)?)
    }

    /// Fetches every job the provider may still be working on.
    pub fn fetch_unfinished(connection: &DbConnection) -> Result<Vec<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(jobs
            .filter(status.ne_all(JobStatus::TERMINAL.to_vec()))
            .filter(provider_request_id.is_not_null())
            .order(id.asc())
            .select(JobDb::as_select())
            .load(conn)?)
    }

    /// Applies `update` unless the job is in one of its
    /// [blocked statuses](JobUpdate::blocked_statuses).
    ///
    /// Returns `None` when the job does not exist or the update was refused.
    pub fn apply(
        target: i32,
        update: &JobUpdate,
        connection: &DbConnection,
    ) -> Result<Option<Self>> {
        let conn = &mut connection.pool.get()?;
        let query = jobs
            .filter(status.ne_all(update.blocked_statuses()))
            .filter(id.eq(target));
        Ok(diesel::update(query)
            .set((update, updated_at.eq(Utc::now())))
            .returning(JobDb::as_returning())
            .get_result(conn)
            .optional()?)
    }

    /// Merges `update` into an in-memory copy, following the same rules as
    /// [`JobDb::apply`].
    pub fn merge(&mut self, update: &JobUpdate) -> bool {
        if update.blocked_statuses().contains(&self.status) {
            return false;
        }
        if let Some(new_status) = update.status {
            self.status = new_status;
        }
        if let Some(url) = &update.result_url {
            self.result_url = Some(url.clone());
        }
        if let Some(text) = &update.description {
            self.description = Some(text.clone());
        }
        if let Some(message) = &update.error {
            self.error = Some(message.clone());
        }
        if let Some(attempts) = update.poll_attempts {
            self.poll_attempts = attempts;
        }
        self.updated_at = Utc::now();
        true
    }
}

impl JobDb {
    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn by_id(target: i32) -> _ {
        crate::schema::jobs::dsl::jobs.filter(id.eq(target))
    }

    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn by_owner(owner: i32) -> _ {
        crate::schema::jobs::dsl::jobs.filter(owner_id.eq(owner))
    }

    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn by_id_and_owner(target: i32, owner: i32) -> _ {
        crate::schema::jobs::dsl::jobs
            .filter(id.eq(target))
            .filter(owner_id.eq(owner))
    }
}
