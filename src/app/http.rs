// ==========================================
// 化工设备参数可视化 - HTTP 接口
// ==========================================
// 路由: /api/{upload,history,datasets/:id,report/:id,health,register,login,logout}
// 鉴权: Authorization: Bearer <token>（兼容 Token <token>）
// 约束: SQLite/解析/渲染在 spawn_blocking 中执行，不阻塞 runtime
// ==========================================

use crate::api::ApiError;
use crate::app::state::AppState;
use crate::domain::{AuthSession, DatasetRecord};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tower_http::trace::TraceLayer;

// ==========================================
// 错误响应
// ==========================================

/// 错误响应体 {"error": ..., "code": ...}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// HTTP 层错误（状态码 + 错误体）
#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    body: ErrorBody,
}

impl HttpError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                code: code.to_string(),
            },
        }
    }

    fn from_multipart(err: MultipartError) -> Self {
        let status = err.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(status, "PAYLOAD_TOO_LARGE", "Uploaded file is too large")
        } else {
            Self::new(status, "INVALID_MULTIPART", err.body_text())
        }
    }

    fn from_join(err: tokio::task::JoinError) -> Self {
        ApiError::InternalError(format!("background task failed: {}", err)).into()
    }
}

/// ApiError -> HTTP 状态码
pub fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::NoFileUploaded
        | ApiError::UnsupportedFormat
        | ApiError::MissingColumn(_)
        | ApiError::InvalidData(_)
        | ApiError::EmptyDataset
        | ApiError::UsernameTaken
        | ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ApiError::DatasetNotFound => StatusCode::NOT_FOUND,
        ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        ApiError::DatabaseError(_)
        | ApiError::ReportRenderError(_)
        | ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        Self::new(status_for(&err), err.code(), err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("请求失败: code={}, error={}", self.body.code, self.body.error);
        } else {
            tracing::debug!("请求被拒绝: code={}, error={}", self.body.code, self.body.error);
        }
        (self.status, Json(self.body)).into_response()
    }
}

type HttpResult<T> = Result<T, HttpError>;

// ==========================================
// 路由
// ==========================================

/// 构建 API 路由（全部挂在 /api 下）
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler));

    let protected = Router::new()
        .route("/upload", post(upload_handler))
        .route("/history", get(history_handler))
        .route("/datasets/:id", get(dataset_handler))
        .route("/report/:id", get(report_handler))
        .route("/logout", post(logout_handler))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .nest("/api", public.merge(protected))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 启动服务直到 shutdown 完成
pub async fn serve<F>(
    state: AppState,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("HTTP 服务已启动: http://{}/api", addr);
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

// ==========================================
// 鉴权
// ==========================================

/// 已认证的调用方
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub token: String,
}

/// 从 Authorization 头提取令牌
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token") {
        Some(token.to_string())
    } else {
        None
    }
}

async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = extract_token(req.headers()) else {
        return HttpError::from(ApiError::Unauthorized).into_response();
    };

    match state.identity.authenticate(&token).await {
        Ok(username) => {
            req.extensions_mut().insert(AuthUser { username, token });
            next.run(req).await
        }
        Err(e) => HttpError::from(e).into_response(),
    }
}

// ==========================================
// 处理函数
// ==========================================

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    password: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> HttpResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::InvalidInput(e.body_text()).into())
}

async fn register_handler(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> HttpResult<(StatusCode, Json<AuthSession>)> {
    let body = json_body(payload)?;
    let api = state.auth_api.clone();
    let session = tokio::task::spawn_blocking(move || {
        api.register(&body.username, &body.password, body.email.as_deref())
    })
    .await
    .map_err(HttpError::from_join)??;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> HttpResult<Json<AuthSession>> {
    let body = json_body(payload)?;
    let api = state.auth_api.clone();
    let session = tokio::task::spawn_blocking(move || api.login(&body.username, &body.password))
        .await
        .map_err(HttpError::from_join)??;
    Ok(Json(session))
}

async fn logout_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> HttpResult<Json<serde_json::Value>> {
    let api = state.auth_api.clone();
    let token = user.token.clone();
    tokio::task::spawn_blocking(move || api.logout(&token))
        .await
        .map_err(HttpError::from_join)??;
    tracing::info!("用户已注销: username={}", user.username);
    Ok(Json(serde_json::json!({ "status": "logged_out" })))
}

async fn upload_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> HttpResult<Json<DatasetRecord>> {
    let mut multipart = multipart.map_err(|_| ApiError::NoFileUploaded)?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(HttpError::from_multipart)?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(HttpError::from_multipart)?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = upload.ok_or(ApiError::NoFileUploaded)?;
    tracing::info!(
        "收到上传: user={}, filename={}, bytes={}",
        user.username,
        filename,
        bytes.len()
    );

    let api = state.dataset_api.clone();
    let record = tokio::task::spawn_blocking(move || api.upload(Some(&filename), &bytes))
        .await
        .map_err(HttpError::from_join)??;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

async fn history_handler(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> HttpResult<Json<Vec<DatasetRecord>>> {
    let Query(query) =
        query.map_err(|e| HttpError::from(ApiError::InvalidInput(e.body_text())))?;
    let api = state.dataset_api.clone();
    let records = tokio::task::spawn_blocking(move || api.history(query.limit))
        .await
        .map_err(HttpError::from_join)??;
    Ok(Json(records))
}

/// 非数字 id 不可能存在，统一按 Dataset not found 处理
fn dataset_id(path: Result<Path<i64>, PathRejection>) -> HttpResult<i64> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::DatasetNotFound.into())
}

async fn dataset_handler(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> HttpResult<Json<DatasetRecord>> {
    let id = dataset_id(path)?;
    let api = state.dataset_api.clone();
    let record = tokio::task::spawn_blocking(move || api.get_dataset(id))
        .await
        .map_err(HttpError::from_join)??;
    Ok(Json(record))
}

async fn report_handler(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> HttpResult<Response> {
    let id = dataset_id(path)?;
    let generated_at = chrono::Local::now().naive_local();
    let api = state.dataset_api.clone();
    let report = tokio::task::spawn_blocking(move || api.render_report(id, generated_at))
        .await
        .map_err(HttpError::from_join)??;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", report.filename),
        ),
    ];
    Ok((headers, report.bytes).into_response())
}
