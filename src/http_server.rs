//! HTTP Server
//!
//! コンプライアンスエンジンとセッションガードを束ねる axum アプリケーション。
//! 公開ルート（ヘルスチェック、プライバシー通知、お問い合わせ）は認証なしで、
//! `/api/admin/*` の保護ルートは [`with_auth`] を通る。

use crate::clock::{Clock, SystemClock};
use crate::compliance::{ComplianceEngine, ConsentData, ConsentType, Locale, NoticeKey};
use crate::config::AppConfig;
use crate::error::Result;
use crate::logging::{AuditFields, LogFields, Logger};
use crate::session::{
    client_ip, with_auth, AdminIdentity, AdminRepository, AuthError, InMemoryAdminRepository,
    LoginRequest, SessionGuard,
};
use axum::{
    extract::{FromRequestParts, Path, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// お問い合わせフォームの必須フィールド
const REQUIRED_CONTACT_FIELDS: &[&str] = &["name", "email", "message"];

/// サーバー状態（共有リソース）
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub compliance: ComplianceEngine,
    pub guard: Arc<SessionGuard>,
    pub admins: Arc<dyn AdminRepository>,
    pub logger: Logger,
}

impl AppState {
    pub fn new(
        config: Arc<AppConfig>,
        clock: Arc<dyn Clock>,
        logger: Logger,
        admins: Arc<dyn AdminRepository>,
    ) -> Self {
        Self {
            compliance: ComplianceEngine::new(Arc::clone(&config), Arc::clone(&clock)),
            guard: Arc::new(SessionGuard::from_config(&config, clock, logger.clone())),
            admins,
            logger,
            config,
        }
    }

    /// 本番構成（システム時計、標準出力ロガー、環境変数の管理者）
    pub fn from_config(config: Arc<AppConfig>) -> Self {
        let admins = Arc::new(InMemoryAdminRepository::from_config(&config));
        Self::new(
            Arc::clone(&config),
            Arc::new(SystemClock),
            Logger::from_config(&config),
            admins,
        )
    }
}

/// リクエスト元の情報
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: Option<String>,
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(Self {
            ip: client_ip(&parts.headers, &parts.extensions),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        })
    }
}

/// Axumルーターを作成
pub fn build_router(state: AppState) -> Router {
    let admin = with_auth(
        Router::new().route("/api/admin/session", get(current_session)),
        Arc::clone(&state.guard),
    );

    Router::new()
        .route("/api/health", get(health))
        .route("/api/privacy/{locale}/{key}", get(privacy_notice))
        .route("/api/contact", post(submit_contact))
        .route("/api/admin/login", post(login))
        .route("/api/admin/logout", post(logout))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// サーバーを開始（Ctrl+C / SIGTERM で停止）
pub async fn serve(state: AppState, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Starting portfolio guard server on {}", listener.local_addr()?);

    axum::serve(
        listener,
        build_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn privacy_notice(
    State(state): State<AppState>,
    Path((locale, key)): Path<(String, String)>,
) -> Json<Value> {
    let locale = Locale::parse(&locale);
    let key = NoticeKey::parse(&key);

    Json(json!({
        "locale": locale,
        "key": key,
        "text": state.compliance.notice(locale, key),
    }))
}

async fn submit_contact(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    let consent = body
        .get("consent")
        .cloned()
        .and_then(|v| serde_json::from_value::<ConsentData>(v).ok());

    let validation = state
        .compliance
        .validate_consent(consent.as_ref(), ConsentType::ContactForm);
    if !validation.valid {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": validation.message,
                "code": validation.code,
            })),
        )
            .into_response();
    }

    let submission = state.compliance.sanitize_contact_data(&body);

    let missing: Vec<&str> = REQUIRED_CONTACT_FIELDS
        .iter()
        .copied()
        .filter(|field| match submission.get(*field) {
            Some(Value::String(s)) => s.is_empty(),
            Some(Value::Null) | None => true,
            Some(_) => false,
        })
        .collect();
    if !missing.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": format!("Missing required fields: {}", missing.join(", ")),
                "code": "VALIDATION_ERROR",
            })),
        )
            .into_response();
    }

    let proof = state.compliance.create_consent_record(
        ConsentType::ContactForm,
        &client.ip,
        client.user_agent.as_deref().unwrap_or_default(),
    );

    state.logger.info(
        LogFields::new("contact_submitted", "Contact form submission received")
            .metadata(Value::Object(submission.clone())),
    );

    (
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "submission": submission,
            "consent": proof,
        })),
    )
        .into_response()
}

async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<LoginRequest>,
) -> std::result::Result<Response, AuthError> {
    let credentials = state.admins.find_by_username(&request.username).await?;

    let issued = match credentials {
        Some(credentials) => state.guard.login(&credentials, &request.password),
        None => Err(AuthError::InvalidCredentials),
    };

    let issued = match issued {
        Ok(issued) => issued,
        Err(e) => {
            state.logger.warn(
                LogFields::new("admin_login_failed", "Admin login failed")
                    .actor("anonymous")
                    .metadata(json!({ "username": request.username, "ip": client.ip })),
            );
            return Err(e);
        }
    };

    state.logger.audit(AuditFields {
        actor: issued.account.username.clone(),
        action: "login".to_string(),
        resource: "admin_session".to_string(),
        resource_id: Some(issued.account.id.to_string()),
        outcome: "success".to_string(),
        ip: Some(client.ip),
        user_agent: client.user_agent,
    });

    Ok((
        [(header::SET_COOKIE, issued.cookie)],
        Json(json!({
            "success": true,
            "admin": issued.account,
        })),
    )
        .into_response())
}

async fn logout(
    State(state): State<AppState>,
    client: ClientInfo,
    headers: HeaderMap,
) -> std::result::Result<Response, AuthError> {
    let cleared = state.guard.clear_cookie()?;

    if let Some(claims) = state.guard.get_session(&headers) {
        state.logger.audit(AuditFields {
            actor: claims.username,
            action: "logout".to_string(),
            resource: "admin_session".to_string(),
            resource_id: Some(claims.id.to_string()),
            outcome: "success".to_string(),
            ip: Some(client.ip),
            user_agent: client.user_agent,
        });
    }

    Ok((
        [(header::SET_COOKIE, cleared)],
        Json(json!({ "success": true })),
    )
        .into_response())
}

async fn current_session(admin: AdminIdentity) -> Json<AdminIdentity> {
    Json(admin)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
