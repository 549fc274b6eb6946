/// Request authentication context
///
/// The API layer validates the bearer token once per request and stores
/// an [`AuthContext`] in the request extensions; handlers read it from
/// there and build a policy [`Actor`](super::policy::Actor) when they
/// need a decision.

use axum::http::HeaderMap;
use uuid::Uuid;

use super::jwt::Claims;
use super::policy::Actor;
use crate::models::user::UserRole;

/// Authenticated identity attached to a request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role carried in the token
    pub role: UserRole,
}

impl AuthContext {
    /// Builds a context from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }

    /// Builds the policy actor, attaching the company looked up for
    /// this request
    pub fn actor(&self, company_id: Option<Uuid>) -> Actor {
        Actor {
            id: self.user_id,
            role: self.role,
            company_id,
        }
    }
}

/// Extracts a bearer token from the Authorization header
///
/// Returns `None` when the header is absent, malformed, or uses a
/// different scheme.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenType;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123"));

        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn test_context_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, UserRole::Supplier, TokenType::Access);

        let ctx = AuthContext::from_claims(&claims);
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.role, UserRole::Supplier);

        let actor = ctx.actor(None);
        assert_eq!(actor.id, user_id);
        assert_eq!(actor.company_id, None);
    }
}
