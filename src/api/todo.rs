use crate::auth::CurrentUser;
use crate::domain::todo::TaskPatch;
use crate::domain::todo::driving_ports::{TaskError, TaskPort};
use crate::external_connections::ExternalConnectivity;
use crate::persistence::db_todo_driven_ports::{DbTaskReader, DbTaskWriter};
use crate::routing_utils::{
    DomainErrorResponse, GenericErrorResponse, Json, Path, Query, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::get;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;
use validator::Validate;

#[derive(OpenApi)]
#[openapi(paths(
    list_tasks,
    count_tasks,
    get_task,
    create_task,
    delete_task,
    patch_task
))]
/// Defines the OpenAPI documentation for the to-do API
pub struct TaskApi;
/// Constant used to group to-do endpoints in OpenAPI documentation
const TODO_API_GROUP: &str = "Todos";

/// Builds a router for the current user's to-do items
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/",
            get(
                |State(app_state): AppState,
                 current_user: CurrentUser,
                 Query(filter): Query<dto::CompletionFilter>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService;

                    list_tasks(current_user, filter, &mut ext_cxn, &task_service).await
                },
            )
            .post(
                |State(app_state): AppState,
                 current_user: CurrentUser,
                 Json(new_task): Json<dto::NewTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService;

                    create_task(current_user, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/count",
            get(
                |State(app_state): AppState,
                 current_user: CurrentUser,
                 Query(filter): Query<dto::CompletionFilter>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService;

                    count_tasks(current_user, filter, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/:todo_id",
            get(
                |State(app_state): AppState,
                 current_user: CurrentUser,
                 Path(todo_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService;

                    get_task(current_user, todo_id, &mut ext_cxn, &task_service).await
                },
            )
            .delete(
                |State(app_state): AppState,
                 current_user: CurrentUser,
                 Path(todo_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService;

                    delete_task(current_user, todo_id, &mut ext_cxn, &task_service).await
                },
            )
            .patch(
                |State(app_state): AppState,
                 current_user: CurrentUser,
                 Path(todo_id): Path<i32>,
                 Json(patch): Json<dto::ColumnPatch>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::todo::TaskService;

                    patch_task(current_user, todo_id, patch, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

fn task_error_response(task_err: TaskError) -> ErrorResponse {
    match task_err {
        TaskError::TaskNotFound => DomainErrorResponse::NotFound.into(),
        TaskError::PortError(err) => GenericErrorResponse(err).into(),
    }
}

#[utoipa::path(
    get,
    path = "/todos",
    tag = TODO_API_GROUP,
    params(
        ("x-authenticated-user-id" = i32, Header, description = "ID of the authenticated user"),
        dto::CompletionFilter,
    ),
    responses(
        (status = 200, description = "The current user's tasks", body = Vec<dto::TodoTask>),
        (status = 401, description = "No authenticated user", body = crate::routing_utils::BasicErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::routing_utils::BasicErrorResponse),
    ),
)]
/// Lists the current user's tasks, optionally filtered by completion
async fn list_tasks(
    current_user: CurrentUser,
    filter: dto::CompletionFilter,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<Vec<dto::TodoTask>>, ErrorResponse> {
    info!(
        "Listing tasks for user {} (completed filter: {:?})",
        current_user.user_id, filter.completed
    );
    let task_reader = DbTaskReader;

    let tasks = task_service
        .tasks_for_user(
            current_user.user_id,
            filter.completed,
            &mut *ext_cxn,
            &task_reader,
        )
        .await
        .map_err(task_error_response)?;

    Ok(Json(tasks.into_iter().map(dto::TodoTask::from).collect()))
}

#[utoipa::path(
    get,
    path = "/todos/count",
    tag = TODO_API_GROUP,
    params(
        ("x-authenticated-user-id" = i32, Header, description = "ID of the authenticated user"),
        dto::CompletionFilter,
    ),
    responses(
        (status = 200, description = "Number of matching tasks", body = dto::TaskCount),
        (status = 401, description = "No authenticated user", body = crate::routing_utils::BasicErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::routing_utils::BasicErrorResponse),
    ),
)]
/// Counts the current user's tasks, optionally filtered by completion
async fn count_tasks(
    current_user: CurrentUser,
    filter: dto::CompletionFilter,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::TaskCount>, ErrorResponse> {
    let task_reader = DbTaskReader;

    let count = task_service
        .count_tasks(
            current_user.user_id,
            filter.completed,
            &mut *ext_cxn,
            &task_reader,
        )
        .await
        .map_err(task_error_response)?;

    Ok(Json(dto::TaskCount { count }))
}

#[utoipa::path(
    get,
    path = "/todos/{todo_id}",
    tag = TODO_API_GROUP,
    params(
        ("x-authenticated-user-id" = i32, Header, description = "ID of the authenticated user"),
        ("todo_id" = i32, Path, description = "ID of the task"),
    ),
    responses(
        (status = 200, description = "The requested task", body = dto::TodoTask),
        (status = 400, description = "The current user has no such task", body = crate::routing_utils::BasicErrorResponse),
        (status = 401, description = "No authenticated user", body = crate::routing_utils::BasicErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::routing_utils::BasicErrorResponse),
    ),
)]
/// Retrieves one of the current user's tasks
async fn get_task(
    current_user: CurrentUser,
    todo_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::TodoTask>, ErrorResponse> {
    let task_reader = DbTaskReader;

    let task = task_service
        .user_task_by_id(current_user.user_id, todo_id, &mut *ext_cxn, &task_reader)
        .await
        .map_err(task_error_response)?;

    Ok(Json(dto::TodoTask::from(task)))
}

#[utoipa::path(
    post,
    path = "/todos",
    tag = TODO_API_GROUP,
    params(("x-authenticated-user-id" = i32, Header, description = "ID of the authenticated user")),
    request_body = dto::NewTask,
    responses(
        (status = 201, description = "Task created", body = dto::TodoTask),
        (status = 400, description = "Invalid task data", body = crate::routing_utils::BasicErrorResponse),
        (status = 401, description = "No authenticated user", body = crate::routing_utils::BasicErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::routing_utils::BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service, new_task))]
/// Adds a task to the current user's list
async fn create_task(
    current_user: CurrentUser,
    new_task: dto::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<(StatusCode, Json<dto::TodoTask>), ErrorResponse> {
    new_task
        .validate()
        .map_err(ValidationErrorResponse::from)?;

    let domain_task = domain::todo::NewTask::from(new_task);
    let task_writer = DbTaskWriter;

    let created_task = task_service
        .create_task_for_user(
            current_user.user_id,
            &domain_task,
            &mut *ext_cxn,
            &task_writer,
        )
        .await
        .map_err(task_error_response)?;

    Ok((StatusCode::CREATED, Json(dto::TodoTask::from(created_task))))
}

#[utoipa::path(
    delete,
    path = "/todos/{todo_id}",
    tag = TODO_API_GROUP,
    params(
        ("x-authenticated-user-id" = i32, Header, description = "ID of the authenticated user"),
        ("todo_id" = i32, Path, description = "ID of the task"),
    ),
    responses(
        (status = 200, description = "Task deleted"),
        (status = 400, description = "The current user has no such task", body = crate::routing_utils::BasicErrorResponse),
        (status = 401, description = "No authenticated user", body = crate::routing_utils::BasicErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::routing_utils::BasicErrorResponse),
    ),
)]
/// Deletes one of the current user's tasks
async fn delete_task(
    current_user: CurrentUser,
    todo_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!("User {} deleting task {todo_id}", current_user.user_id);
    let task_writer = DbTaskWriter;

    task_service
        .delete_task(current_user.user_id, todo_id, &mut *ext_cxn, &task_writer)
        .await
        .map_err(task_error_response)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    patch,
    path = "/todos/{todo_id}",
    tag = TODO_API_GROUP,
    params(
        ("x-authenticated-user-id" = i32, Header, description = "ID of the authenticated user"),
        ("todo_id" = i32, Path, description = "ID of the task"),
    ),
    request_body = dto::ColumnPatch,
    responses(
        (status = 200, description = "Task updated"),
        (status = 400, description = "Column not patchable, invalid value or missing task", body = crate::routing_utils::BasicErrorResponse),
        (status = 401, description = "No authenticated user", body = crate::routing_utils::BasicErrorResponse),
        (status = 500, description = "Unexpected failure", body = crate::routing_utils::BasicErrorResponse),
    ),
)]
/// Changes the title or completion state of one of the current user's tasks
async fn patch_task(
    current_user: CurrentUser,
    todo_id: i32,
    patch: dto::ColumnPatch,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<StatusCode, ErrorResponse> {
    info!(
        "User {} patching column \"{}\" of task {todo_id}",
        current_user.user_id, patch.column
    );
    let task_patch =
        TaskPatch::new(&patch.column, &patch.value).map_err(DomainErrorResponse::from)?;
    let task_writer = DbTaskWriter;

    task_service
        .patch_task(
            current_user.user_id,
            todo_id,
            &task_patch,
            &mut *ext_cxn,
            &task_writer,
        )
        .await
        .map_err(task_error_response)?;

    Ok(StatusCode::OK)
}
