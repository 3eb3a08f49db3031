//! Main Crate Error

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    R2D2(#[from] diesel::r2d2::PoolError),

    #[error(transparent)]
    Diesel(#[from] diesel::result::Error),

    #[error("Database migration failed: {0}")]
    Migration(String),

    #[error(transparent)]
    Auth(#[from] crate::auth::error::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /* Configuration Errors */
    #[error("Env Variable '{0}' missing")]
    MissingEnv(&'static str),

    #[error("Env Variable '{name}' has an invalid value '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    /* Account Errors */
    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password must be at least {0} characters long")]
    WeakPassword(usize),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Auth Token Creation")]
    AuthTokenCreation,

    #[error("Wrong Credentials")]
    WrongCredentials,

    #[error("Context Missing")]
    CtxMissing,

    /* Api Errors */
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    InvalidUpload(String),

    #[error("Job not found")]
    JobNotFound,

    /* Provider Errors */
    #[error("FAL API key not configured")]
    ProviderNotConfigured,

    #[error("Provider returned status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Unknown provider application '{0}'")]
    UnknownApplication(String),

    /* Tracker Errors */
    #[error("Job tracker is not running")]
    TrackerStopped,
}
