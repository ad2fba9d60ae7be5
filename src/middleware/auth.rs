use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    utils::{client_fingerprint, error_codes, error_to_api_response},
};

/// 校验 Bearer 令牌并把解码出的 Claims 挂到请求上。
/// 指纹取自 User-Agent，换了客户端的令牌直接拒绝。
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        return unauthenticated("缺少登录凭证");
    };

    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let fingerprint = client_fingerprint(user_agent);

    let now = chrono::Utc::now().timestamp();
    match state.issuer.verify(token, &fingerprint, now) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!("token rejected: {}", e);
            unauthenticated("登录凭证无效或已过期")
        }
    }
}

fn unauthenticated(msg: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        error_to_api_response::<()>(error_codes::UNAUTHENTICATED, msg.to_string()),
    )
        .into_response()
}
