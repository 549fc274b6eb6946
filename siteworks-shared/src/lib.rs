//! # Siteworks Shared Library
//!
//! This crate contains the types and business logic shared across the
//! Siteworks construction-site management platform.
//!
//! ## Module Organization
//!
//! - `models`: Database models (users, companies, sites, and site sub-resources)
//! - `auth`: Authentication (JWT, passwords) and the authorization policy
//! - `db`: Connection pool and migration runner
//! - `notify`: Best-effort notification side-channel

pub mod auth;
pub mod db;
pub mod models;
pub mod notify;

/// Current version of the Siteworks shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
