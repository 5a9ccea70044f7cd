//! Dashboard HTTP server
//!
//! Serves the web interface and the JSON API that drives the session.
//! All routes share one session behind a mutex, so actions run one at a
//! time.

use crate::access::{AccessMatrix, CSV_FILE_NAME, UserGrant};
use crate::config::Stack;
use crate::error::SessionError;
use crate::session::{AuditEntry, Credentials, LoadReport, RemovalReport, Session, TokenCheck};
use crate::util::find_available_port;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Default port for the dashboard server
pub const DEFAULT_DASHBOARD_PORT: u16 = 19893;

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Address to bind the dashboard server
    pub bind: SocketAddr,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_DASHBOARD_PORT)),
        }
    }
}

impl DashboardConfig {
    /// Create config from host and port
    pub fn new(host: &str, port: u16) -> Result<Self, std::net::AddrParseError> {
        let bind: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self { bind })
    }
}

/// Shared state for dashboard handlers
#[derive(Clone)]
pub struct DashboardState {
    pub session: Arc<Mutex<Session>>,
}

/// Error body returned by API routes
#[derive(Serialize)]
struct ApiError {
    error: String,
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionError::Config(_) | SessionError::EmptySelection => StatusCode::BAD_REQUEST,
            SessionError::NotLoaded => StatusCode::CONFLICT,
            SessionError::Table(_) => StatusCode::BAD_GATEWAY,
            SessionError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ApiError {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct StackInfo {
    id: &'static str,
    label: &'static str,
    url: Option<&'static str>,
}

/// Session overview for the sidebar
#[derive(Serialize)]
struct StateInfo {
    version: &'static str,
    stack: Stack,
    api_host: String,
    organization_id: Option<String>,
    token_set: bool,
    loaded: bool,
    grant_count: usize,
    project_count: usize,
    audit_count: usize,
    stacks: Vec<StackInfo>,
}

#[derive(Deserialize)]
struct LoadRequest {
    #[serde(default)]
    reload: bool,
}

#[derive(Deserialize)]
struct RemoveRequest {
    email: String,
    projects: Vec<String>,
}

/// Build the dashboard router
pub fn router(session: Arc<Mutex<Session>>) -> Router {
    let state = DashboardState { session };

    Router::new()
        .route("/", get(dashboard_html))
        .route("/assets/style.css", get(serve_css))
        .route("/assets/app.js", get(serve_js))
        .route("/api/state", get(api_state))
        .route("/api/credentials", post(api_credentials))
        .route("/api/token/check", post(api_check_token))
        .route("/api/users/load", post(api_load_users))
        .route("/api/matrix", get(api_matrix))
        .route("/api/users/{email}/grants", get(api_user_grants))
        .route("/api/access/remove", post(api_remove_access))
        .route("/api/audit", get(api_audit))
        .route("/api/export.csv", get(api_export_csv))
        .route("/api/logout", post(api_logout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the dashboard server
///
/// Port discovery is used to find an available port if the configured port is taken.
pub async fn run_dashboard(
    config: DashboardConfig,
    session: Arc<Mutex<Session>>,
) -> anyhow::Result<()> {
    let host = config.bind.ip().to_string();
    let actual_port = find_available_port(&host, config.bind.port()).await?;
    let bind_addr = SocketAddr::new(config.bind.ip(), actual_port);

    let listener = TcpListener::bind(bind_addr).await?;
    info!("Dashboard running at http://{}", bind_addr);

    axum::serve(listener, router(session)).await?;

    Ok(())
}

async fn dashboard_html() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn serve_css() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css")],
        DASHBOARD_CSS,
    )
        .into_response()
}

async fn serve_js() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript")],
        DASHBOARD_JS,
    )
        .into_response()
}

async fn api_state(State(state): State<DashboardState>) -> Json<StateInfo> {
    let session = state.session.lock().await;
    let table = session.table();
    Json(StateInfo {
        version: env!("CARGO_PKG_VERSION"),
        stack: session.stack(),
        api_host: session.api_host().to_string(),
        organization_id: session.organization_id().map(String::from),
        token_set: session.has_token(),
        loaded: table.is_some(),
        grant_count: table.map_or(0, |t| t.len()),
        project_count: table.map_or(0, |t| t.project_count()),
        audit_count: session.audit().len(),
        stacks: Stack::ALL
            .into_iter()
            .map(|s| StackInfo {
                id: s.id(),
                label: s.label(),
                url: s.url(),
            })
            .collect(),
    })
}

async fn api_credentials(
    State(state): State<DashboardState>,
    Json(creds): Json<Credentials>,
) -> Result<StatusCode, SessionError> {
    state.session.lock().await.set_credentials(creds)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn api_check_token(
    State(state): State<DashboardState>,
) -> Result<Json<TokenCheck>, SessionError> {
    let session = state.session.lock().await;
    Ok(Json(session.on_check_token().await?))
}

async fn api_load_users(
    State(state): State<DashboardState>,
    Json(request): Json<LoadRequest>,
) -> Result<Json<LoadReport>, SessionError> {
    let mut session = state.session.lock().await;
    let report = if request.reload {
        session.on_reload().await?
    } else {
        session.on_load_users().await?
    };
    Ok(Json(report))
}

async fn api_matrix(
    State(state): State<DashboardState>,
) -> Result<Json<AccessMatrix>, SessionError> {
    let session = state.session.lock().await;
    session.matrix().map(Json).ok_or(SessionError::NotLoaded)
}

async fn api_user_grants(
    State(state): State<DashboardState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<UserGrant>>, SessionError> {
    let session = state.session.lock().await;
    let table = session.table().ok_or(SessionError::NotLoaded)?;
    Ok(Json(table.grants_for(&email).cloned().collect()))
}

async fn api_remove_access(
    State(state): State<DashboardState>,
    Json(request): Json<RemoveRequest>,
) -> Result<Json<RemovalReport>, SessionError> {
    let mut session = state.session.lock().await;
    let report = session
        .on_remove_access(&request.email, &request.projects)
        .await?;
    Ok(Json(report))
}

async fn api_audit(State(state): State<DashboardState>) -> Json<Vec<AuditEntry>> {
    let session = state.session.lock().await;
    Json(session.audit().newest_first().cloned().collect())
}

async fn api_export_csv(State(state): State<DashboardState>) -> Result<Response, SessionError> {
    let session = state.session.lock().await;
    let table = session.table().ok_or(SessionError::NotLoaded)?;
    let csv = table
        .to_csv()
        .inspect_err(|e| error!(error = %e, "CSV export failed"))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", CSV_FILE_NAME),
            ),
        ],
        csv,
    )
        .into_response())
}

async fn api_logout(State(state): State<DashboardState>) -> StatusCode {
    state.session.lock().await.logout();
    StatusCode::NO_CONTENT
}

/// Dashboard HTML template
const DASHBOARD_HTML: &str = include_str!("../../assets/dashboard/index.html");

/// Dashboard CSS styles
const DASHBOARD_CSS: &str = include_str!("../../assets/dashboard/style.css");

/// Dashboard JavaScript
const DASHBOARD_JS: &str = include_str!("../../assets/dashboard/app.js");
