//! Service configuration loaded from environment variables.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use jsonwebtoken::Algorithm;

use crate::db::config::DbConfig;
use crate::prelude::*;
use crate::tracker::TrackerSettings;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3434";
pub const DEFAULT_FAL_QUEUE_URL: &str = "https://queue.fal.run";
const DEFAULT_FAL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_POLL_MAX_ATTEMPTS: i32 = 120;
const DEFAULT_TOKEN_EXPIRATION_MINUTES: i64 = 30;

/// FAL queue API access.
#[derive(Clone)]
pub struct FalConfig {
    /// `FAL_KEY`. Job submission is refused while this is unset.
    pub key: Option<String>,
    /// Base URL of the queue API.
    pub queue_url: String,
    /// Upper bound for one queue API request, connecting included.
    pub request_timeout: Duration,
}

/// Token signing parameters.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub token_duration: TimeDelta,
}

/// Complete service configuration.
pub struct AppConfig {
    /// `None` runs the service on the in-memory store.
    pub database: Option<DbConfig>,
    pub fal: FalConfig,
    pub jwt: JwtConfig,
    pub bind_address: SocketAddr,
    pub tracker: TrackerSettings,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// ```rust,no_run
    /// use imged::config::AppConfig;
    ///
    /// let config = AppConfig::from_env().expect("invalid configuration");
    /// println!("{config}");
    /// ```
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let database = get("DATABASE_URL").map(DbConfig::new);

        let fal_timeout: u64 = parse_or("FAL_TIMEOUT_SECS", get("FAL_TIMEOUT_SECS"))?
            .unwrap_or(DEFAULT_FAL_TIMEOUT_SECS);
        if fal_timeout == 0 {
            return Err(Error::InvalidEnv {
                name: "FAL_TIMEOUT_SECS",
                value: fal_timeout.to_string(),
            });
        }
        let fal = FalConfig {
            key: get("FAL_KEY"),
            queue_url: get("FAL_QUEUE_URL")
                .unwrap_or_else(|| String::from(DEFAULT_FAL_QUEUE_URL))
                .trim_end_matches('/')
                .to_string(),
            request_timeout: Duration::from_secs(fal_timeout),
        };

        let secret = get("JWT_SECRET").ok_or(Error::MissingEnv("JWT_SECRET"))?;
        let algorithm = match get("JWT_ALGORITHM") {
            Some(value) => parse_algorithm(&value)?,
            None => Algorithm::HS256,
        };
        let minutes: i64 = parse_or("TOKEN_EXPIRATION_MINUTES", get("TOKEN_EXPIRATION_MINUTES"))?
            .unwrap_or(DEFAULT_TOKEN_EXPIRATION_MINUTES);
        let token_duration = TimeDelta::try_minutes(minutes)
            .filter(|duration| duration > &TimeDelta::zero())
            .ok_or_else(|| Error::InvalidEnv {
                name: "TOKEN_EXPIRATION_MINUTES",
                value: minutes.to_string(),
            })?;

        let bind_address = parse_or("BIND_ADDRESS", get("BIND_ADDRESS"))?.unwrap_or(
            SocketAddr::from_str(DEFAULT_BIND_ADDRESS).map_err(|_| Error::InvalidEnv {
                name: "BIND_ADDRESS",
                value: String::from(DEFAULT_BIND_ADDRESS),
            })?,
        );

        let poll_interval: u64 = parse_or("POLL_INTERVAL_SECS", get("POLL_INTERVAL_SECS"))?
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        let max_attempts: i32 = parse_or("POLL_MAX_ATTEMPTS", get("POLL_MAX_ATTEMPTS"))?
            .unwrap_or(DEFAULT_POLL_MAX_ATTEMPTS);
        if max_attempts <= 0 {
            return Err(Error::InvalidEnv {
                name: "POLL_MAX_ATTEMPTS",
                value: max_attempts.to_string(),
            });
        }

        Ok(Self {
            database,
            fal,
            jwt: JwtConfig {
                secret,
                algorithm,
                token_duration,
            },
            bind_address,
            tracker: TrackerSettings {
                poll_interval: Duration::from_secs(poll_interval),
                max_attempts,
            },
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|_| Error::InvalidEnv { name, value })
        })
        .transpose()
}

/// Only HMAC algorithms can be driven by a shared `JWT_SECRET`.
fn parse_algorithm(value: &str) -> Result<Algorithm> {
    match Algorithm::from_str(value.trim()) {
        Ok(algorithm @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(algorithm),
        _ => Err(Error::InvalidEnv {
            name: "JWT_ALGORITHM",
            value: String::from(value),
        }),
    }
}

impl Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "bind={} database={} fal_queue={} fal_key={} jwt_algorithm={:?} poll_interval={:?} max_attempts={}",
            self.bind_address,
            match &self.database {
                Some(db) => db.to_string(),
                None => String::from("in-memory"),
            },
            self.fal.queue_url,
            if self.fal.key.is_some() { "REDACTED" } else { "unset" },
            self.jwt.algorithm,
            self.tracker.poll_interval,
            self.tracker.max_attempts,
        )
    }
}
