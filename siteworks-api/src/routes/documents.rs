/// Document endpoints
///
/// # Endpoints
///
/// - `GET /api/documents` - List documents visible to the caller
/// - `GET /api/documents/:id` - Get one document
/// - `POST /api/documents` - Register a document
/// - `PUT /api/documents/:id` - Update document metadata
/// - `DELETE /api/documents/:id` - Delete (uploader or site owner)
/// - `POST /api/documents/:id/download` - Record a download
/// - `GET /api/documents/stats/overview` - Aggregate counts

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use siteworks_shared::{
    auth::{
        middleware::AuthContext,
        policy::{self, Action, DocumentRefs, ReadScope},
    },
    models::{
        document::{
            CreateDocument, Document, DocumentCategory, DocumentStats, UpdateDocument,
        },
        site::Site,
    },
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Query parameters for the document listing
#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    /// Restrict to one site (membership checked)
    pub site_id: Option<Uuid>,

    /// Optional category filter
    pub category: Option<DocumentCategory>,
}

/// Register document body; the uploader is always the caller
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    pub site_id: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Title is required"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(length(min = 1, message = "File name is required"))]
    pub file_name: String,

    #[validate(length(min = 1, message = "File path is required"))]
    pub file_path: String,

    pub file_size: i64,

    #[validate(length(min = 1, message = "MIME type is required"))]
    pub mime_type: String,

    pub category: DocumentCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
}

fn refs(document: &Document) -> DocumentRefs {
    DocumentRefs {
        uploaded_by: document.uploaded_by,
        is_public: document.is_public,
    }
}

/// Loads a document with its site access (if any) and checks the action
async fn authorize(
    state: &AppState,
    auth: &AuthContext,
    id: Uuid,
    action: Action,
) -> Result<Document, ApiError> {
    let document = Document::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    let actor = state.actor(auth).await?;
    let access = match document.site_id {
        Some(site_id) => Site::load_access(&state.db, site_id).await?,
        None => None,
    };

    policy::document_action(&actor, access.as_ref(), &refs(&document), action)?;

    Ok(document)
}

/// Lists documents visible to the caller
///
/// With a `site_id` the listing covers the site (membership required);
/// without one it covers everything in the caller's scope plus their
/// own uploads and public documents.
pub async fn list_documents(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListDocumentsQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let actor = state.actor(&auth).await?;

    if let Some(site_id) = query.site_id {
        let access = Site::load_access(&state.db, site_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;
        policy::site_action(&actor, &access, Action::Read)?;

        // Drop entries the caller could not fetch individually, such as
        // private documents when the caller is a supplier.
        let mut documents = Document::list_by_site(&state.db, site_id, query.category).await?;
        documents.retain(|document| {
            policy::document_action(&actor, Some(&access), &refs(document), Action::Read).is_ok()
        });
        return Ok(Json(documents));
    }

    let documents = match policy::read_scope(&actor)? {
        ReadScope::Company(company_id) => {
            Document::list_for_company(&state.db, company_id, actor.id, query.category).await?
        }
        ReadScope::ContractorOf(user_id) => {
            Document::list_for_contractor(&state.db, user_id, query.category).await?
        }
        ReadScope::SupplierOf(user_id) => {
            Document::list_uploaded_or_public(&state.db, user_id, query.category).await?
        }
    };

    Ok(Json(documents))
}

/// Returns one document
pub async fn get_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    let document = authorize(&state, &auth, id, Action::Read).await?;

    Ok(Json(document))
}

/// Registers a document
///
/// When attached to a site the caller must be a site member; documents
/// without a site are private to their uploader unless public.
pub async fn create_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    req.validate().map_err(ApiError::from_validation)?;

    let actor = state.actor(&auth).await?;

    if let Some(site_id) = req.site_id {
        let access = Site::load_access(&state.db, site_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Site not found".to_string()))?;
        policy::document_create(&actor, &access)?;
    }

    let document = Document::create(
        &state.db,
        CreateDocument {
            site_id: req.site_id,
            uploaded_by: actor.id,
            title: req.title,
            description: req.description,
            file_name: req.file_name,
            file_path: req.file_path,
            file_size: req.file_size,
            mime_type: req.mime_type,
            category: req.category,
            tags: req.tags,
            is_public: req.is_public,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

/// Updates document metadata (uploader or site owner)
pub async fn update_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateDocument>,
) -> ApiResult<Json<Document>> {
    authorize(&state, &auth, id, Action::Write).await?;

    let document = Document::update(&state.db, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    Ok(Json(document))
}

/// Deletes a document record (uploader or site owner)
pub async fn delete_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    authorize(&state, &auth, id, Action::Delete).await?;

    let deleted = Document::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Records a download and returns the updated document
pub async fn download_document(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Document>> {
    authorize(&state, &auth, id, Action::Read).await?;

    let document = Document::record_download(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;

    Ok(Json(document))
}

/// Aggregate document counts for the caller's scope
pub async fn document_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DocumentStats>> {
    let actor = state.actor(&auth).await?;

    let stats = match policy::read_scope(&actor)? {
        ReadScope::Company(company_id) => {
            Document::stats_for_company(&state.db, company_id).await?
        }
        ReadScope::ContractorOf(user_id) | ReadScope::SupplierOf(user_id) => {
            Document::stats_for_uploader(&state.db, user_id).await?
        }
    };

    Ok(Json(stats))
}
