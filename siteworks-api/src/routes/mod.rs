/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login, refresh, invitations, push registration
/// - `companies`: Company management
/// - `sites`: Sites and site assignments
/// - `tasks`: Work tasks
/// - `issues`: Issue reports
/// - `materials`: Material requests
/// - `payments`: Payments
/// - `documents`: Document records
/// - `notifications`: In-app notification inbox

pub mod health;
pub mod auth;
pub mod companies;
pub mod sites;
pub mod tasks;
pub mod issues;
pub mod materials;
pub mod payments;
pub mod documents;
pub mod notifications;
