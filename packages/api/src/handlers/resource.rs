use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::BlobPart;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Authenticated;
use crate::models::resource::{NewModelQuery, ResourceKind, ResourceListResponse, ResourceRecord};
use crate::state::AppState;

fn parse_kind(raw: &str) -> Result<ResourceKind, AppError> {
    raw.parse().map_err(AppError::NotFound)
}

#[utoipa::path(
    get,
    path = "/{kind}",
    tag = "Resources",
    operation_id = "listResources",
    summary = "List every record of a kind",
    params(("kind" = ResourceKind, Path, description = "problem, data, algo or model")),
    responses(
        (status = 200, description = "All records, oldest first", body = ResourceListResponse),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Unknown kind (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn list_resources(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ResourceListResponse>, AppError> {
    let kind = parse_kind(&kind)?;
    let items = state.resources(kind).list().await?;
    let total = items.len() as u64;
    Ok(Json(ResourceListResponse { items, total }))
}

#[utoipa::path(
    post,
    path = "/{kind}",
    tag = "Resources",
    operation_id = "createResource",
    summary = "Upload a new resource",
    description = "Problems, data and algorithms are uploaded as `multipart/form-data` whose \
        fields are `uuid` (optional), `owner`, `name` (problem and algo), `size`, \
        `description` (problem, a `.md` file) and finally `blob`, which must be the last \
        field. Models are uploaded as a raw body with `Content-Length` and the `algo` query \
        parameter.",
    params(
        ("kind" = ResourceKind, Path, description = "problem, data, algo or model"),
        NewModelQuery,
    ),
    request_body(content_type = "multipart/form-data", description = "Resource form"),
    responses(
        (status = 201, description = "Resource created", body = ResourceRecord),
        (status = 400, description = "Invalid form (REQUIRED_FIELD_MISSING, UNKNOWN_FIELD, BUFFER_OVERFLOW, ...)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Unknown kind or algorithm (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Identifier already used (IDENTIFIER_CONFLICT)", body = ErrorBody),
        (status = 500, description = "Blob or record write failed (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, _auth, query, request))]
pub async fn create_resource(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<NewModelQuery>,
    request: Request,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let service = state.resources(kind);
    let (parts, body) = request.into_parts();

    let record = match kind {
        ResourceKind::Model => {
            service
                .create_model(&query, parts.headers.get(header::CONTENT_LENGTH), body)
                .await?
        }
        _ => {
            service
                .create(parts.headers.get(header::CONTENT_TYPE), body)
                .await?
        }
    };

    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/{kind}/{id}",
    tag = "Resources",
    operation_id = "getResource",
    summary = "Get one record",
    params(
        ("kind" = ResourceKind, Path, description = "problem, data, algo or model"),
        ("id" = String, Path, description = "Record UUID"),
    ),
    responses(
        (status = 200, description = "Record found", body = ResourceRecord),
        (status = 400, description = "Malformed identifier (MALFORMED_IDENTIFIER)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn get_resource(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<ResourceRecord>, AppError> {
    let kind = parse_kind(&kind)?;
    let record = state.resources(kind).get(&id).await?;
    Ok(Json(record))
}

#[utoipa::path(
    patch,
    path = "/{kind}/{id}",
    tag = "Resources",
    operation_id = "patchResource",
    summary = "Update scalar fields of a record",
    description = "Multipart form carrying any of `uuid`, `owner`, `name` (problem and algo) \
        and `description` (problem). `uuid` must equal the record's identifier. Size and \
        blob cannot change.",
    params(
        ("kind" = ResourceKind, Path, description = "problem, data, algo or model"),
        ("id" = String, Path, description = "Record UUID"),
    ),
    request_body(content_type = "multipart/form-data", description = "Fields to change"),
    responses(
        (status = 200, description = "Updated record", body = ResourceRecord),
        (status = 400, description = "Invalid form (UNKNOWN_FIELD, REQUIRED_FIELD_MISSING, ...)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Identifier change requested (IDENTIFIER_CONFLICT)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, _auth, request))]
pub async fn patch_resource(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    request: Request,
) -> Result<Json<ResourceRecord>, AppError> {
    let kind = parse_kind(&kind)?;
    let (parts, body) = request.into_parts();
    let record = state
        .resources(kind)
        .patch(&id, parts.headers.get(header::CONTENT_TYPE), body)
        .await?;
    Ok(Json(record))
}

#[utoipa::path(
    get,
    path = "/{kind}/{id}/blob",
    tag = "Resources",
    operation_id = "getResourceBlob",
    summary = "Download the blob of a record",
    params(
        ("kind" = ResourceKind, Path, description = "problem, data, algo or model"),
        ("id" = String, Path, description = "Record UUID"),
    ),
    responses(
        (status = 200, description = "Blob content", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed identifier (MALFORMED_IDENTIFIER)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Blob unreadable (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn get_resource_blob(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    let (record, reader) = state.resources(kind).get_blob(&id, BlobPart::Primary).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, record.size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", record.id),
        )
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    get,
    path = "/{kind}/{id}/description",
    tag = "Resources",
    operation_id = "getResourceDescription",
    summary = "Download the Markdown description of a problem",
    params(
        ("kind" = ResourceKind, Path, description = "Only `problem` has a description"),
        ("id" = String, Path, description = "Record UUID"),
    ),
    responses(
        (status = 200, description = "Markdown description", content_type = "text/markdown"),
        (status = 400, description = "Malformed identifier (MALFORMED_IDENTIFIER)", body = ErrorBody),
        (status = 401, description = "Unauthorized (CREDENTIALS_MISSING, INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip(state, _auth))]
pub async fn get_resource_description(
    _auth: Authenticated,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    let (_, reader) = state
        .resources(kind)
        .get_blob(&id, BlobPart::Description)
        .await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/markdown; charset=utf-8")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
