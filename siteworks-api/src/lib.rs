//! # Siteworks API Server
//!
//! REST API for the Siteworks construction-site management platform.
//!
//! ## Module Organization
//!
//! - `app`: Application state and router builder
//! - `config`: Environment-based configuration
//! - `error`: Unified API error type and HTTP mapping
//! - `middleware`: Security headers
//! - `routes`: HTTP request handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
