/// Database models for Siteworks
///
/// Each model lives in its own module and owns the SQL that touches its
/// table. Models expose static async functions taking a `&PgPool`; the
/// API crate never writes SQL directly.
///
/// # Modules
///
/// - `user`: Accounts (owners, contractors, suppliers) and push tokens
/// - `company`: Owner-scoped companies (one per owner)
/// - `site`: Construction sites and site assignments
/// - `task`: Work tasks assigned on a site
/// - `issue`: Issues reported against a site
/// - `material`: Material requests routed to suppliers
/// - `payment`: Payments between site participants
/// - `document`: Uploaded documents with download tracking
/// - `notification`: In-app notification inbox
/// - `audit`: Append-only audit trail of financial/status events

pub mod audit;
pub mod company;
pub mod document;
pub mod issue;
pub mod material;
pub mod notification;
pub mod payment;
pub mod priority;
pub mod site;
pub mod task;
pub mod user;
