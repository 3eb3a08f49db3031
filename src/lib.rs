//! Backend for AI image generation and editing jobs.
//!
//! Users register and log in with a bearer token, submit text-to-image or
//! image-to-image requests, and the service forwards them to FAL AI's queue
//! API. Every request becomes a [`models::job::JobDb`] owned by the user and
//! a [`tracker::JobTracker`] monitor keeps it in sync with the provider until
//! it completes or fails.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod prelude;
pub mod provider;
mod schema;
pub mod store;
pub mod tracker;
pub mod upload;
pub mod web;
