/// Document model and database operations
///
/// Documents are file records attached to a site (or uploaded without
/// one). `is_public` opens a document for reading to any authenticated
/// user regardless of role or membership. Downloads are counted through
/// `record_download`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Kind of document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_category", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentCategory {
    Plan,
    Permit,
    Contract,
    Invoice,
    Report,
    Photo,
    Other,
}

/// Uploaded document record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub site_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub category: DocumentCategory,
    pub tags: Vec<String>,

    /// Readable by any authenticated user
    pub is_public: bool,

    pub download_count: i32,
    pub last_downloaded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const DOCUMENT_COLUMNS: &str = "id, site_id, uploaded_by, title, description, file_name, \
     file_path, file_size, mime_type, category, tags, is_public, download_count, \
     last_downloaded_at, created_at, updated_at";

/// Input for registering a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocument {
    pub site_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub category: DocumentCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Input for updating document metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<DocumentCategory>,
    pub tags: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

/// Aggregate counts for the document stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentStats {
    pub total: i64,
    pub total_size: i64,
    pub total_downloads: i64,
    pub public_count: i64,
}

impl Document {
    /// Registers a new document
    pub async fn create(pool: &PgPool, data: CreateDocument) -> Result<Self, sqlx::Error> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            INSERT INTO documents (site_id, uploaded_by, title, description, file_name,
                                   file_path, file_size, mime_type, category, tags, is_public)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(data.site_id)
        .bind(data.uploaded_by)
        .bind(data.title)
        .bind(data.description)
        .bind(data.file_name)
        .bind(data.file_path)
        .bind(data.file_size)
        .bind(data.mime_type)
        .bind(data.category)
        .bind(data.tags)
        .bind(data.is_public)
        .fetch_one(pool)
        .await?;

        Ok(document)
    }

    /// Finds a document by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let document = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(document)
    }

    /// Lists documents on a site, optionally filtered by category
    pub async fn list_by_site(
        pool: &PgPool,
        site_id: Uuid,
        category: Option<DocumentCategory>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE site_id = $1
              AND ($2::document_category IS NULL OR category = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(site_id)
        .bind(category)
        .fetch_all(pool)
        .await?;

        Ok(documents)
    }

    /// Lists documents visible within a company
    ///
    /// Covers documents on the company's sites, the caller's own
    /// uploads, and public documents.
    pub async fn list_for_company(
        pool: &PgPool,
        company_id: Uuid,
        user_id: Uuid,
        category: Option<DocumentCategory>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let documents = sqlx::query_as::<_, Document>(
            r#"
            SELECT d.*
            FROM documents d
            LEFT JOIN sites s ON s.id = d.site_id
            WHERE (s.company_id = $1 OR d.uploaded_by = $2 OR d.is_public)
              AND ($3::document_category IS NULL OR d.category = $3)
            ORDER BY d.created_at DESC
            "#,
        )
        .bind(company_id)
        .bind(user_id)
        .bind(category)
        .fetch_all(pool)
        .await?;

        Ok(documents)
    }

    /// Lists documents visible to a contractor
    ///
    /// Covers documents on sites the contractor is assigned to, their
    /// own uploads, and public documents.
    pub async fn list_for_contractor(
        pool: &PgPool,
        user_id: Uuid,
        category: Option<DocumentCategory>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE (uploaded_by = $1
                   OR is_public
                   OR site_id IN (SELECT site_id FROM site_assignments
                                  WHERE user_id = $1 AND role = 'contractor'))
              AND ($2::document_category IS NULL OR category = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .bind(category)
        .fetch_all(pool)
        .await?;

        Ok(documents)
    }

    /// Lists a user's own uploads plus public documents
    ///
    /// The supplier scope: private documents on their sites are not
    /// theirs to read.
    pub async fn list_uploaded_or_public(
        pool: &PgPool,
        user_id: Uuid,
        category: Option<DocumentCategory>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE (uploaded_by = $1 OR is_public)
              AND ($2::document_category IS NULL OR category = $2)
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .bind(category)
        .fetch_all(pool)
        .await?;

        Ok(documents)
    }

    /// Updates document metadata
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateDocument,
    ) -> Result<Option<Self>, sqlx::Error> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                tags = COALESCE($5, tags),
                is_public = COALESCE($6, is_public),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.category)
        .bind(data.tags)
        .bind(data.is_public)
        .fetch_optional(pool)
        .await?;

        Ok(document)
    }

    /// Bumps the download counter and stamps the download time
    pub async fn record_download(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let document = sqlx::query_as::<_, Document>(&format!(
            r#"
            UPDATE documents
            SET download_count = download_count + 1,
                last_downloaded_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DOCUMENT_COLUMNS}
            "#,
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(document)
    }

    /// Deletes a document record
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Aggregate counts across a company's sites
    pub async fn stats_for_company(
        pool: &PgPool,
        company_id: Uuid,
    ) -> Result<DocumentStats, sqlx::Error> {
        let stats = sqlx::query_as::<_, DocumentStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(d.file_size), 0) AS total_size,
                   COALESCE(SUM(d.download_count), 0)::BIGINT AS total_downloads,
                   COUNT(*) FILTER (WHERE d.is_public) AS public_count
            FROM documents d
            JOIN sites s ON s.id = d.site_id
            WHERE s.company_id = $1
            "#,
        )
        .bind(company_id)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }

    /// Aggregate counts for one user's uploads
    pub async fn stats_for_uploader(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<DocumentStats, sqlx::Error> {
        let stats = sqlx::query_as::<_, DocumentStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(file_size), 0) AS total_size,
                   COALESCE(SUM(download_count), 0)::BIGINT AS total_downloads,
                   COUNT(*) FILTER (WHERE is_public) AS public_count
            FROM documents
            WHERE uploaded_by = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }
}
