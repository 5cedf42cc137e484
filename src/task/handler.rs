use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::num::ParseIntError;

use crate::error::ApiError;
use crate::fields;
use crate::logger::ScopedLogger;
use crate::middleware::request_scope;
use crate::scope::RequestScope;
use crate::task::model::{Task, TaskError};
use crate::task::service::TaskService;
use crate::value::Value;

pub const DEFAULT_LIMIT: usize = 10;
pub const DEFAULT_OFFSET: usize = 0;

/// Task routes wrapped in the request-scope middleware.
///
/// Every request gets a logger derived from `base`.
pub fn router(service: TaskService, base: ScopedLogger) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/:id", get(get_task))
        .layer(middleware::from_fn_with_state(base, request_scope))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: String,
}

async fn list_tasks(
    State(service): State<TaskService>,
    scope: RequestScope,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let log = scope.logger().with(&fields!["where", "handler"]);

    let limit = parse_count(params.limit.as_deref(), DEFAULT_LIMIT).map_err(|err| {
        log.debug("handler: error parsing limit", &[Value::from("error"), Value::error(&err)]);
        ApiError::BadRequest("Invalid limit".to_string())
    })?;
    let offset = parse_count(params.offset.as_deref(), DEFAULT_OFFSET).map_err(|err| {
        log.debug("handler: error parsing offset", &[Value::from("error"), Value::error(&err)]);
        ApiError::BadRequest("Invalid offset".to_string())
    })?;
    let status = params.status.as_deref().filter(|s| !s.is_empty());

    let tasks = service
        .list_tasks(&scope, status, limit, offset)
        .await
        .map_err(|err| {
            log.error("handler: error getting tasks", &[Value::from("error"), Value::error(&err)]);
            ApiError::Internal("error getting tasks".to_string())
        })?;

    log.info("handler: tasks retrieved from repository", &fields!["count", tasks.len()]);
    Ok(Json(tasks))
}

async fn get_task(
    State(service): State<TaskService>,
    scope: RequestScope,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let log = scope.logger().with(&fields!["where", "handler"]);

    let task = service.get_task(&scope, &id).await.map_err(|err| {
        log.error("handler: error getting task", &[Value::from("error"), Value::error(&err)]);
        match err {
            TaskError::NotFound => ApiError::NotFound(err.to_string()),
            TaskError::InvalidId(_) => ApiError::BadRequest("Invalid task ID".to_string()),
        }
    })?;

    log.info("handler: task retrieved from repository", &fields!["id", task.id]);
    Ok(Json(task))
}

async fn create_task(
    State(service): State<TaskService>,
    scope: RequestScope,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let log = scope.logger().with(&fields!["where", "handler"]);

    let Json(body) = payload.map_err(|rejection| {
        log.debug(
            "handler: error decoding request body",
            &fields!["error", rejection.body_text()],
        );
        ApiError::BadRequest("Invalid request body".to_string())
    })?;
    if body.title.is_empty() {
        log.debug("handler: title is required", &[]);
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let task = service.create_task(&scope, &body.title).await.map_err(|err| {
        log.error(
            "handler: error creating task",
            &[
                Value::from("title"),
                Value::from(&body.title),
                Value::from("error"),
                Value::error(&err),
            ],
        );
        ApiError::Internal("error creating task".to_string())
    })?;

    log.info("handler: task created successfully", &fields!["id", task.id]);
    Ok((StatusCode::CREATED, Json(task)))
}

/// Parse an optional non-negative integer query parameter. Missing or empty
/// means `default`.
fn parse_count(raw: Option<&str>, default: usize) -> Result<usize, ParseIntError> {
    match raw {
        None | Some("") => Ok(default),
        Some(raw) => raw.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_count_defaults_and_rejects_garbage() {
        assert_eq!(parse_count(None, 10), Ok(10));
        assert_eq!(parse_count(Some(""), 10), Ok(10));
        assert_eq!(parse_count(Some("3"), 10), Ok(3));
        assert!(parse_count(Some("-1"), 10).is_err());
        assert!(parse_count(Some("ten"), 10).is_err());
    }
}
