/// API middleware
///
/// # Modules
///
/// - `security`: Security-related response headers

pub mod security;
