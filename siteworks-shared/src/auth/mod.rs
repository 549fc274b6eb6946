/// Authentication and authorization for Siteworks
///
/// # Modules
///
/// - `jwt`: Token generation and validation (HS256)
/// - `password`: Argon2id password hashing
/// - `middleware`: Bearer-token extraction and the request `AuthContext`
/// - `policy`: The pure role/site authorization policy

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
