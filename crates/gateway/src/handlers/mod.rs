//! API handlers module

pub mod content;
pub mod health;
pub mod sources;

use axum::http::Uri;
use catalog_common::errors::AppError;

/// Unknown routes answer with the uniform error body
pub async fn fallback(uri: Uri) -> AppError {
    AppError::NotFound {
        resource: "Route".to_string(),
        key: uri.path().to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::{create_router, AppState};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use catalog_common::{config::DatabaseConfig, db, AppConfig, DbPool};
    use metrics_exporter_prometheus::PrometheusHandle;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Router over a fresh in-memory store
    pub async fn app() -> Router {
        app_with_metrics(None).await
    }

    pub async fn app_with_metrics(metrics: Option<PrometheusHandle>) -> Router {
        let pool = DbPool::new(&DatabaseConfig::in_memory()).await.unwrap();
        db::create_schema(&pool).await.unwrap();
        let state = AppState::new(Arc::new(AppConfig::default()), pool, metrics).unwrap();
        create_router(state)
    }

    /// Send one request and return status, headers and the JSON body (Null when empty)
    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }
}
