/// Company model and database operations
///
/// A company groups an owner with the contractors and suppliers they
/// have invited. Each owner may have exactly one company, enforced by a
/// unique index on `owner_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Company owned by a single owner account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,

    /// The owner account; unique across companies
    pub owner_id: Uuid,

    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const COMPANY_COLUMNS: &str = "id, name, owner_id, description, address, phone, email, website, \
     is_active, created_at, updated_at";

/// Input for creating a company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    pub owner_id: Uuid,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

/// Input for updating a company; unset fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCompany {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

impl Company {
    /// Creates a company for an owner
    ///
    /// Takes any executor so owner signup can create the account and
    /// the company in one transaction.
    ///
    /// # Errors
    ///
    /// Returns a unique-violation error if the owner already has a
    /// company.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateCompany,
    ) -> Result<Self, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies (name, owner_id, description, address, phone, email, website)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COMPANY_COLUMNS}
            "#,
        ))
        .bind(data.name)
        .bind(data.owner_id)
        .bind(data.description)
        .bind(data.address)
        .bind(data.phone)
        .bind(data.email)
        .bind(data.website)
        .fetch_one(executor)
        .await?;

        Ok(company)
    }

    /// Finds a company by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }

    /// Finds the company owned by a given user
    pub async fn find_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE owner_id = $1",
        ))
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }

    /// Updates company details
    ///
    /// Fields left as `None` keep their current value.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCompany,
    ) -> Result<Option<Self>, sqlx::Error> {
        let company = sqlx::query_as::<_, Company>(&format!(
            r#"
            UPDATE companies
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                address = COALESCE($4, address),
                phone = COALESCE($5, phone),
                email = COALESCE($6, email),
                website = COALESCE($7, website),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {COMPANY_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.address)
        .bind(data.phone)
        .bind(data.email)
        .bind(data.website)
        .fetch_optional(pool)
        .await?;

        Ok(company)
    }
}
