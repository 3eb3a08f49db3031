//! User accounts.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::connection::DbConnection;
use crate::prelude::*;
use crate::schema::users::dsl::*;

/// A registered user.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserDb {
    /// Unique user ID.
    pub id: i32,
    /// Login email, unique across users.
    pub email: String,
    /// Argon2 hash of the password.
    #[serde(skip_serializing)]
    pub hashed_password: String,
    /// When this user registered.
    pub created_at: DateTime<Utc>,
    /// When this user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new user.
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::users)]
pub struct UserCreate {
    pub email: String,
    pub hashed_password: String,
}

impl UserCreate {
    /// Saves the user, reporting [`Error::EmailTaken`] on a duplicate email.
    pub fn save(self, connection: &DbConnection) -> Result<UserDb> {
        use diesel::result::{DatabaseErrorKind, Error as DieselError};

        let conn = &mut connection.pool.get()?;
        diesel::insert_into(users)
            .values(&self)
            .returning(UserDb::as_returning())
            .get_result(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    Error::EmailTaken
                }
                err => err.into(),
            })
    }
}

impl UserDb {
    pub fn fetch_by_email(target: &str, connection: &DbConnection) -> Result<Option<Self>> {
        let conn = &mut connection.pool.get()?;
        Ok(UserDb::by_email(target)
            .select(UserDb::as_select())
            .get_result(conn)
            .optional()?)
    }
}

impl UserDb {
    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn by_email(target: &str) -> _ {
        crate::schema::users::dsl::users.filter(email.eq(target))
    }
}
