//! Greeting service: a durable store as the source of truth, a TTL side
//! cache in front of it, and creation events published off the request path.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
