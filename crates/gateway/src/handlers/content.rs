//! Content handlers

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::extract::{ApiPath, ValidatedJson};
use crate::AppState;
use catalog_common::{
    db::models::ContentCategory,
    errors::{AppError, Result},
    Content, SourceKey,
};

/// List every content item with its sources
pub async fn list_content(State(state): State<AppState>) -> Result<Json<Vec<Content>>> {
    Ok(Json(state.contents.get_all_with_sources().await?))
}

/// Create a content item; any client-supplied id is ignored
pub async fn create_content(
    State(state): State<AppState>,
    ValidatedJson(content): ValidatedJson<Content>,
) -> Result<impl IntoResponse> {
    let created = state.contents.add(content).await?;

    let id = created.id.ok_or_else(|| AppError::Internal {
        message: "store returned content without an id".to_string(),
    })?;

    tracing::info!(content_id = id, name = %created.name, "Content created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/content/{}", id))],
        Json(created),
    ))
}

/// Get a content item and its sources by id
pub async fn get_content(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Content>> {
    state
        .contents
        .get_with_sources(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Content", id))
}

/// Replace the fields of an existing content item; the path id wins
pub async fn update_content(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ValidatedJson(mut content): ValidatedJson<Content>,
) -> Result<Json<Content>> {
    content.id = Some(id);
    let updated = state.contents.update(content).await?;

    // Echo the row with its sources; fall back to the written row if it
    // was deleted in between
    let current = state.contents.get_with_sources(id).await?;
    Ok(Json(current.unwrap_or(updated)))
}

/// Delete a content item and its sources; deleting twice is not an error
pub async fn delete_content(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<StatusCode> {
    let deleted = state.contents.remove(id).await?;
    tracing::info!(content_id = id, deleted, "Content delete");
    Ok(StatusCode::NO_CONTENT)
}

/// Stamp a content item as renewed now
pub async fn renew_content(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> Result<Json<Content>> {
    Ok(Json(state.contents.renew(id).await?))
}

pub async fn list_movies(State(state): State<AppState>) -> Result<Json<Vec<Content>>> {
    list_by_category(State(state), ApiPath(ContentCategory::Movie)).await
}

pub async fn list_by_category(
    State(state): State<AppState>,
    ApiPath(category): ApiPath<ContentCategory>,
) -> Result<Json<Vec<Content>>> {
    Ok(Json(state.contents.get_all_by_category(category).await?))
}

/// Content owning the source `{name}/{source_id}`
pub async fn get_by_source(
    State(state): State<AppState>,
    ApiPath((name, source_id)): ApiPath<(String, i32)>,
) -> Result<Json<Content>> {
    let key = SourceKey::new(name, source_id);
    state
        .contents
        .get_by_source(&key)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            resource: "Content for source".to_string(),
            key: key.to_string(),
        })
}
