/// User model and database operations
///
/// Users come in three roles. Owners sign up with email and password,
/// create a company, and manage sites. Contractors and suppliers are
/// invited by an owner and authenticate by phone number.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('owner', 'contractor', 'supplier');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) UNIQUE,
///     phone VARCHAR(50) UNIQUE,
///     password_hash TEXT,
///     role user_role NOT NULL,
///     trade contractor_trade,
///     invited_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     company_id UUID,
///     push_tokens TEXT[] NOT NULL DEFAULT '{}',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     last_login_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use siteworks_shared::models::user::{User, CreateUser, UserRole};
/// # use sqlx::PgPool;
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     name: "Asha Builder".to_string(),
///     email: Some("asha@example.com".to_string()),
///     phone: None,
///     password_hash: Some("$argon2id$...".to_string()),
///     role: UserRole::Owner,
///     trade: None,
///     invited_by: None,
///     company_id: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Role of a user within the platform
///
/// The role is fixed at account creation and drives every authorization
/// decision. It is stored as a Postgres enum, not free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Owns a company and its sites; full control within the company
    Owner,

    /// Works on assigned sites; can report progress and issues
    Contractor,

    /// Fulfils material requests on assigned sites
    Supplier,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "owner",
            UserRole::Contractor => "contractor",
            UserRole::Supplier => "supplier",
        }
    }
}

/// Trade specialization of a contractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contractor_trade", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractorTrade {
    Electrical,
    Plumbing,
    Carpentry,
    Masonry,
    Painting,
    Roofing,
    Hvac,
    Landscaping,
    General,
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (owners; unique when present)
    pub email: Option<String>,

    /// Phone number (contractors and suppliers; unique when present)
    pub phone: Option<String>,

    /// Argon2id password hash; never serialized in API responses
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,

    /// Fixed role
    pub role: UserRole,

    /// Trade, for contractors
    pub trade: Option<ContractorTrade>,

    /// Owner who invited this user (null for owners)
    pub invited_by: Option<Uuid>,

    /// Company this user belongs to
    pub company_id: Option<Uuid>,

    /// Registered push notification tokens
    pub push_tokens: Vec<String>,

    /// Whether the account may log in
    pub is_active: bool,

    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, name, email, phone, password_hash, role, trade, \
     invited_by, company_id, push_tokens, is_active, last_login_at, \
     created_at, updated_at";

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub trade: Option<ContractorTrade>,
    pub invited_by: Option<Uuid>,
    pub company_id: Option<Uuid>,
}

impl User {
    /// Creates a new user
    ///
    /// Takes any executor so it can run inside a transaction alongside
    /// company creation.
    ///
    /// # Errors
    ///
    /// Returns an error if a unique constraint (email or phone) is
    /// violated or the database operation fails.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, phone, password_hash, role, trade, invited_by, company_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.email)
        .bind(data.phone)
        .bind(data.password_hash)
        .bind(data.role)
        .bind(data.trade)
        .bind(data.invited_by)
        .bind(data.company_id)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds an active user by email (owner login)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND is_active",
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds an active user by phone (contractor/supplier login)
    pub async fn find_by_phone(pool: &PgPool, phone: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE phone = $1 AND is_active",
        ))
        .bind(phone)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Records a successful login
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET last_login_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Attaches a user to a company
    ///
    /// Called when an owner creates their company, and when an invited
    /// contractor or supplier completes registration.
    pub async fn set_company(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        company_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET company_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(company_id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Registers a push token, ignoring duplicates
    pub async fn add_push_token(pool: &PgPool, id: Uuid, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET push_tokens = array_append(push_tokens, $2), updated_at = NOW()
            WHERE id = $1 AND NOT ($2 = ANY(push_tokens))
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Lists active users in a company, optionally filtered by role
    pub async fn list_by_company(
        pool: &PgPool,
        company_id: Uuid,
        role: Option<UserRole>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE company_id = $1
              AND is_active
              AND ($2::user_role IS NULL OR role = $2)
            ORDER BY name ASC
            "#,
        ))
        .bind(company_id)
        .bind(role)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Deactivates an account, keeping its rows for history
    pub async fn deactivate(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(UserRole::Owner.as_str(), "owner");
        assert_eq!(UserRole::Contractor.as_str(), "contractor");
        assert_eq!(UserRole::Supplier.as_str(), "supplier");
    }

    #[test]
    fn test_role_json_is_screaming() {
        assert_eq!(serde_json::to_string(&UserRole::Owner).unwrap(), "\"OWNER\"");
        let role: UserRole = serde_json::from_str("\"CONTRACTOR\"").unwrap();
        assert_eq!(role, UserRole::Contractor);
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Test".to_string(),
            email: Some("t@example.com".to_string()),
            phone: None,
            password_hash: Some("secret-hash".to_string()),
            role: UserRole::Owner,
            trade: None,
            invited_by: None,
            company_id: None,
            push_tokens: vec![],
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
