use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use crate::{AppState, auth::CurrentUser, error::AppError, utils::success_to_api_response};

use super::model::{CreateTodoRequest, ListTodosQuery, Todo, UpdateTodoRequest, validate_title};

// Rejections from these extractors become `AppError::Validation`.
type JsonBody<T> = WithRejection<Json<T>, AppError>;
type QueryParams<T> = WithRejection<Query<T>, AppError>;
type TodoId = WithRejection<Path<i64>, AppError>;

pub async fn list_todos(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    WithRejection(Query(query), _): QueryParams<ListTodosQuery>,
) -> Result<impl IntoResponse, AppError> {
    let todos = Todo::list_for_owner(&state.pool, &user.id, query.completed).await?;
    Ok(success_to_api_response(todos))
}

pub async fn create_todo(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    WithRejection(Json(req), _): JsonBody<CreateTodoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = validate_title(&req.title).map_err(AppError::Validation)?;
    let todo = Todo::create(&state.pool, &user.id, &title, req.is_complete).await?;

    tracing::info!(id = todo.id, user = %user.id, "todo created");
    Ok((StatusCode::CREATED, success_to_api_response(todo)))
}

pub async fn get_todo(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    WithRejection(Path(id), _): TodoId,
) -> Result<impl IntoResponse, AppError> {
    let todo = Todo::find_for_owner(&state.pool, id, &user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(success_to_api_response(todo))
}

pub async fn update_todo(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    WithRejection(Path(id), _): TodoId,
    WithRejection(Json(req), _): JsonBody<UpdateTodoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = req
        .title
        .as_deref()
        .map(validate_title)
        .transpose()
        .map_err(AppError::Validation)?;

    let todo =
        Todo::update_for_owner(&state.pool, id, &user.id, title.as_deref(), req.is_complete)
            .await?
            .ok_or(AppError::NotFound)?;
    Ok(success_to_api_response(todo))
}

pub async fn delete_todo(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    WithRejection(Path(id), _): TodoId,
) -> Result<StatusCode, AppError> {
    if !Todo::delete_for_owner(&state.pool, id, &user.id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(id, user = %user.id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Admin routes sit behind `require_admin`.

pub async fn list_all_todos(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let todos = Todo::list_all(&state.pool).await?;
    Ok(success_to_api_response(todos))
}

pub async fn delete_any_todo(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    WithRejection(Path(id), _): TodoId,
) -> Result<StatusCode, AppError> {
    if !Todo::delete_any(&state.pool, id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(id, admin = %user.id, "todo deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}
