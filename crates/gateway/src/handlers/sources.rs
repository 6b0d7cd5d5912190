//! Source handlers, nested under their content item

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::extract::{ApiPath, ValidatedJson};
use crate::AppState;
use catalog_common::{
    errors::{AppError, Result},
    Source, SourceKey,
};

async fn ensure_content(state: &AppState, content_id: i32) -> Result<()> {
    match state.contents.get(content_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("Content", content_id)),
    }
}

/// List the sources of a content item
pub async fn list_sources(
    State(state): State<AppState>,
    ApiPath(content_id): ApiPath<i32>,
) -> Result<Json<Vec<Source>>> {
    ensure_content(&state, content_id).await?;
    Ok(Json(state.sources.get_all_by_content(content_id).await?))
}

/// Attach a source to a content item; the path decides the owner
pub async fn create_source(
    State(state): State<AppState>,
    ApiPath(content_id): ApiPath<i32>,
    ValidatedJson(mut source): ValidatedJson<Source>,
) -> Result<impl IntoResponse> {
    ensure_content(&state, content_id).await?;

    source.content_id = content_id;
    let created = state.sources.add(source).await?;

    tracing::info!(
        content_id,
        source = %SourceKey::new(created.name.clone(), created.id),
        "Source attached"
    );

    let location = format!(
        "/content/{}/sources/{}/{}",
        content_id, created.name, created.id
    );
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(created)))
}

/// Get one source of a content item by its composite key
pub async fn get_source(
    State(state): State<AppState>,
    ApiPath((content_id, name, source_id)): ApiPath<(i32, String, i32)>,
) -> Result<Json<Source>> {
    let key = SourceKey::new(name, source_id);

    state
        .sources
        .get(key.clone().into())
        .await?
        .filter(|source| source.content_id == content_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            resource: format!("Source of content {}", content_id),
            key: key.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing::{app, send};
    use axum::http::{header, Method, StatusCode};
    use serde_json::json;

    async fn create_content(app: &axum::Router, name: &str) -> i64 {
        let (status, _, body) = send(
            app,
            Method::POST,
            "/content/",
            Some(json!({ "name": name, "type": "movie" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_attach_and_read_sources() {
        let app = app().await;
        let id = create_content(&app, "Inception").await;
        let base = format!("/content/{}/sources", id);

        let (status, headers, first) =
            send(&app, Method::POST, &base, Some(json!({ "name": "imdb", "id": 1 }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            headers[header::LOCATION].to_str().unwrap(),
            format!("{}/imdb/1", base)
        );
        assert_eq!(first["content_id"], id);

        let (status, _, _) =
            send(&app, Method::POST, &base, Some(json!({ "name": "imdb", "id": 2 }))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _, list) = send(&app, Method::GET, &base, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 2);

        let (status, _, one) = send(&app, Method::GET, &format!("{}/imdb/1", base), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one, first);

        let (status, _, owner) = send(&app, Method::GET, "/content/by-source/imdb/2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(owner["id"], id);
    }

    #[tokio::test]
    async fn test_content_reads_embed_sources() {
        let app = app().await;
        let id = create_content(&app, "Arrival").await;
        let base = format!("/content/{}/sources", id);
        send(&app, Method::POST, &base, Some(json!({ "name": "tmdb", "id": 329865 }))).await;
        send(&app, Method::POST, &base, Some(json!({ "name": "imdb", "id": 2543164 }))).await;

        let (status, _, body) = send(&app, Method::GET, &format!("/content/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["sources"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["imdb", "tmdb"]);

        let (_, _, list) = send(&app, Method::GET, "/content/", None).await;
        assert_eq!(list[0]["sources"], body["sources"]);

        let (_, _, renewed) =
            send(&app, Method::POST, &format!("/content/{}/renew", id), None).await;
        assert_eq!(renewed["sources"], body["sources"]);
    }

    #[tokio::test]
    async fn test_source_name_must_be_a_path_segment() {
        let app = app().await;
        let id = create_content(&app, "Heat").await;
        let base = format!("/content/{}/sources", id);

        let (status, _, body) =
            send(&app, Method::POST, &base, Some(json!({ "name": "a/b", "id": 2 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status_code"], 400);

        let (_, _, list) = send(&app, Method::GET, &base, None).await;
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_source_conflicts() {
        let app = app().await;
        let id = create_content(&app, "Heat").await;
        let base = format!("/content/{}/sources", id);

        send(&app, Method::POST, &base, Some(json!({ "name": "tmdb", "id": 949 }))).await;
        let (status, _, body) =
            send(&app, Method::POST, &base, Some(json!({ "name": "tmdb", "id": 949 }))).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status_code"], 409);
    }

    #[tokio::test]
    async fn test_sources_of_missing_content() {
        let app = app().await;

        let (status, _, _) = send(&app, Method::GET, "/content/5/sources", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(
            &app,
            Method::POST,
            "/content/5/sources",
            Some(json!({ "name": "imdb", "id": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _, _) = send(&app, Method::GET, "/content/by-source/imdb/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_content_drops_sources() {
        let app = app().await;
        let id = create_content(&app, "Alien").await;
        let base = format!("/content/{}/sources", id);
        send(&app, Method::POST, &base, Some(json!({ "name": "imdb", "id": 78748 }))).await;

        let (status, _, _) = send(&app, Method::DELETE, &format!("/content/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _, _) =
            send(&app, Method::GET, "/content/by-source/imdb/78748", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
