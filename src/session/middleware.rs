// Session Middleware for Axum

use super::guard::SessionGuard;
use super::types::{AdminIdentity, AuthError};
use crate::logging::{AuditFields, LogFields};
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, Extensions, HeaderMap},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

/// ルーター全体を管理者セッションで保護する
///
/// `route_layer` を使うため、未登録パスは 401 ではなく 404 になる。
pub fn with_auth<S>(router: Router<S>, guard: Arc<SessionGuard>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(middleware::from_fn_with_state(guard, require_admin))
}

/// 管理者セッション必須ミドルウェア
///
/// セッションがなければ警告ログを出して 401 を返し、ハンドラーは呼ばない。
/// セッションがあれば [`AdminIdentity`] を extensions に格納し、監査ログを出してから
/// ハンドラーを呼ぶ。
pub async fn require_admin(
    State(guard): State<Arc<SessionGuard>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().to_string();
    let ip = client_ip(request.headers(), request.extensions());

    let Some(claims) = guard.get_session(request.headers()) else {
        guard.logger().warn(
            LogFields::new("unauthorized_access", "Unauthorized admin access attempt")
                .actor("anonymous")
                .metadata(json!({
                    "path": path,
                    "method": method,
                    "ip": ip,
                })),
        );
        return AuthError::Unauthorized.into_response();
    };

    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    guard.logger().audit(AuditFields {
        actor: claims.username.clone(),
        action: method,
        resource: path,
        resource_id: None,
        outcome: "accessed".to_string(),
        ip: Some(ip),
        user_agent,
    });

    request.extensions_mut().insert(AdminIdentity {
        id: claims.id,
        username: claims.username,
    });

    next.run(request).await
}

/// クライアントIPを解決
///
/// `x-forwarded-for` の先頭、`x-real-ip`、接続元アドレスの順。いずれもなければ `"unknown"`。
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = forwarded.or_else(real_ip) {
        return ip.to_string();
    }

    extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
