//! HTTP routes.
//!
//! The engine does not authenticate. An upstream proxy does, and forwards the
//! caller's id in `X-User-Id`.

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rollcall_domain::{ActionRecord, ChronicleEntry, MemoryFact, SessionId, UserId};
use rollcall_shared::{
    CreateSessionRequest, HealthResponse, MasterTargetRequest, SessionMasterResponse,
    SessionResponse, SuccessResponse, UpdateSessionRequest,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::app::App;
use crate::infrastructure::ports::RepoError;
use crate::use_cases::session::{
    CreateSessionError, CreateSessionInput, ManageSessionError, MasterAuthorityError,
    SessionUpdate,
};

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/sessions", post(create_session).get(list_sessions))
        .route("/api/sessions/code/{code}", get(get_session_by_code))
        .route(
            "/api/sessions/{id}",
            get(get_session).patch(update_session).delete(delete_session),
        )
        .route("/api/sessions/{id}/masters", get(list_masters))
        .route("/api/sessions/{id}/promote-master", post(promote_master))
        .route("/api/sessions/{id}/demote-master", post(demote_master))
        .route("/api/sessions/{id}/renounce-master", post(renounce_master))
        .route("/api/sessions/{id}/actions", get(list_actions))
        .route("/api/sessions/{id}/history", get(list_history))
        .route("/api/sessions/{id}/memory", get(list_memory))
}

/// The caller's user id, if the proxy supplied a valid one.
pub fn bound_user_from_headers(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| UserId::new(v).ok())
}

/// Extractor for handlers that need an identity.
pub struct AuthenticatedUser(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        bound_user_from_headers(&parts.headers)
            .map(AuthenticatedUser)
            .ok_or(ApiError::Unauthorized)
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
    })
}

async fn create_session(
    State(app): State<Arc<App>>,
    AuthenticatedUser(owner): AuthenticatedUser,
    Json(body): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = app
        .use_cases
        .session
        .create
        .execute(CreateSessionInput {
            owner,
            name: body.name,
            description: body.description,
            campaign_id: body.campaign_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

async fn list_sessions(
    State(app): State<Arc<App>>,
    AuthenticatedUser(owner): AuthenticatedUser,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let sessions = app
        .use_cases
        .session
        .manage
        .list_for_owner(&owner)
        .await?;
    Ok(Json(sessions.iter().map(SessionResponse::from).collect()))
}

async fn get_session_by_code(
    State(app): State<Arc<App>>,
    Path(code): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = app.use_cases.session.manage.get_by_code(&code).await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn get_session(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = app
        .use_cases
        .session
        .manage
        .get(SessionId::from_uuid(id))
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn update_session(
    State(app): State<Arc<App>>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSessionRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = app
        .use_cases
        .session
        .manage
        .update(
            &requester,
            SessionId::from_uuid(id),
            SessionUpdate {
                name: body.name,
                description: body.description,
                status: body.status,
            },
        )
        .await?;
    Ok(Json(SessionResponse::from(&session)))
}

async fn delete_session(
    State(app): State<Arc<App>>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    app.use_cases
        .session
        .manage
        .delete(&requester, SessionId::from_uuid(id))
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn list_masters(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SessionMasterResponse>>, ApiError> {
    let masters = app
        .use_cases
        .session
        .masters
        .list(SessionId::from_uuid(id))
        .await?;
    Ok(Json(masters.iter().map(SessionMasterResponse::from).collect()))
}

async fn promote_master(
    State(app): State<Arc<App>>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MasterTargetRequest>,
) -> Result<Json<SessionMasterResponse>, ApiError> {
    let target = UserId::new(&body.user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let grant = app
        .use_cases
        .session
        .masters
        .promote(SessionId::from_uuid(id), &requester, &target)
        .await?;
    Ok(Json(SessionMasterResponse::from(&grant)))
}

async fn demote_master(
    State(app): State<Arc<App>>,
    AuthenticatedUser(requester): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(body): Json<MasterTargetRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let target = UserId::new(&body.user_id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    app.use_cases
        .session
        .masters
        .demote(SessionId::from_uuid(id), &requester, &target)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn renounce_master(
    State(app): State<Arc<App>>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiError> {
    app.use_cases
        .session
        .masters
        .renounce(SessionId::from_uuid(id), &user)
        .await?;
    Ok(Json(SuccessResponse::ok()))
}

async fn list_actions(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ActionRecord>>, ApiError> {
    let actions = app
        .use_cases
        .session
        .manage
        .action_log(SessionId::from_uuid(id))
        .await?;
    Ok(Json(actions))
}

async fn list_history(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChronicleEntry>>, ApiError> {
    let history = app
        .use_cases
        .session
        .manage
        .history(SessionId::from_uuid(id))
        .await?;
    Ok(Json(history))
}

async fn list_memory(
    State(app): State<Arc<App>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<MemoryFact>>, ApiError> {
    let memory = app
        .use_cases
        .session
        .manage
        .memory(SessionId::from_uuid(id))
        .await?;
    Ok(Json(memory))
}

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Missing X-User-Id header").into_response()
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<CreateSessionError> for ApiError {
    fn from(e: CreateSessionError) -> Self {
        match e {
            CreateSessionError::Invalid(e) => ApiError::BadRequest(e.to_string()),
            CreateSessionError::RoomCodeExhausted => ApiError::Internal(e.to_string()),
            CreateSessionError::Repo(e) => e.into(),
        }
    }
}

impl From<ManageSessionError> for ApiError {
    fn from(e: ManageSessionError) -> Self {
        match e {
            ManageSessionError::NotFound | ManageSessionError::CodeNotFound => {
                ApiError::NotFound(e.to_string())
            }
            ManageSessionError::NotOwner => ApiError::Forbidden(e.to_string()),
            ManageSessionError::Invalid(e) => ApiError::BadRequest(e.to_string()),
            ManageSessionError::Repo(e) => e.into(),
        }
    }
}

impl From<MasterAuthorityError> for ApiError {
    fn from(e: MasterAuthorityError) -> Self {
        match e {
            MasterAuthorityError::SessionNotFound => ApiError::NotFound(e.to_string()),
            MasterAuthorityError::Forbidden(v) => ApiError::Forbidden(v.to_string()),
            MasterAuthorityError::Repo(e) => e.into(),
        }
    }
}
