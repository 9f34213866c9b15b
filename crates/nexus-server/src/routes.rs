use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use nexus_core::directory::{DeletedUser, FacultyRecord};
use nexus_core::ids::{TicketId, UserId};
use nexus_core::inputs::{
    AddFacultyInput, CommentInput, CreateTicketInput, LoginInput, UpdateTicketInput,
};
use nexus_core::stats::{FacultyStats, StatusCounts};
use nexus_core::ticket::Comment;
use nexus_core::Principal;
use nexus_engine::{TicketDetail, TicketView};

use crate::error::ApiResult;
use crate::extract::{bearer_token, resolve_principal, Caller};
use crate::server::AppState;

#[derive(Serialize)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Principal>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in_secs: u64,
    pub user: Principal,
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

// ── Session ──

pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Json<SessionResponse>> {
    let Some(token) = bearer_token(&headers) else {
        return Ok(Json(SessionResponse { authenticated: false, user: None }));
    };
    match resolve_principal(&state, &token).await {
        Ok(principal) => Ok(Json(SessionResponse {
            authenticated: true,
            user: Some(principal),
        })),
        Err(e) if e.status() == StatusCode::UNAUTHORIZED => {
            Ok(Json(SessionResponse { authenticated: false, user: None }))
        }
        Err(e) => Err(e),
    }
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(input) = body?;
    let principal = state
        .desk_call(move |desk| desk.login(&input.username, &input.password))
        .await?;
    let token = state.sessions.issue(principal.id);
    Ok(Json(LoginResponse {
        token: token.as_str().to_string(),
        expires_in_secs: state.sessions.ttl().as_secs(),
        user: principal,
    }))
}

/// Always succeeds; an unknown or missing token is already logged out.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = bearer_token(&headers) {
        if state.sessions.revoke(&token) {
            info!("session revoked");
        }
    }
    Json(json!({ "success": true }))
}

// ── Tickets ──

pub async fn stats(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<StatusCounts>> {
    let counts = state.desk_call(move |desk| desk.stats(&caller.principal)).await?;
    Ok(Json(counts))
}

pub async fn list_feedback(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<TicketView>>> {
    let tickets = state
        .desk_call(move |desk| desk.list_tickets(&caller.principal))
        .await?;
    Ok(Json(tickets))
}

pub async fn create_feedback(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CreateTicketInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TicketView>)> {
    let Json(input) = body?;
    let view = state
        .desk_call(move |desk| desk.create_ticket(&caller.principal, &input))
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_feedback(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<TicketDetail>> {
    let Path(id) = id?;
    let detail = state
        .desk_call(move |desk| desk.get_ticket(&caller.principal, TicketId::new(id)))
        .await?;
    Ok(Json(detail))
}

pub async fn update_feedback(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateTicketInput>, JsonRejection>,
) -> ApiResult<Json<TicketView>> {
    let Path(id) = id?;
    let Json(input) = body?;
    let view = state
        .desk_call(move |desk| desk.update_ticket(&caller.principal, TicketId::new(id), &input))
        .await?;
    Ok(Json(view))
}

pub async fn add_comment(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<CommentInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let Path(id) = id?;
    let Json(input) = body?;
    let comment = state
        .desk_call(move |desk| desk.add_comment(&caller.principal, TicketId::new(id), &input))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn my_tasks(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<TicketView>>> {
    let tasks = state.desk_call(move |desk| desk.my_tasks(&caller.principal)).await?;
    Ok(Json(tasks))
}

// ── Directory ──

pub async fn list_faculty(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<FacultyRecord>>> {
    let roster = state
        .desk_call(move |desk| desk.list_faculty(&caller.principal))
        .await?;
    Ok(Json(roster))
}

pub async fn add_faculty(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<AddFacultyInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<FacultyRecord>)> {
    let Json(input) = body?;
    let record = state
        .desk_call(move |desk| desk.add_faculty(&caller.principal, &input))
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn faculty_stats(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<FacultyStats>>> {
    let stats = state
        .desk_call(move |desk| desk.faculty_stats(&caller.principal))
        .await?;
    Ok(Json(stats))
}

pub async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<DeletedUser>> {
    let Path(id) = id?;
    let deleted = state
        .desk_call(move |desk| desk.delete_user(&caller.principal, UserId::new(id)))
        .await?;
    let revoked = state.sessions.revoke_user(deleted.id);
    if revoked > 0 {
        info!(user_id = %deleted.id, revoked, "sessions revoked for deleted user");
    }
    Ok(Json(deleted))
}
