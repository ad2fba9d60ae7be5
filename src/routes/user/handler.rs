use axum::{
    extract::{Extension, Json, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;

use crate::{
    AppState,
    domain::ProfileUpdate,
    service::ServiceError,
    token::Claims,
    utils::{
        client_fingerprint, error_codes, error_to_api_response, is_valid_email, is_valid_password,
        success_to_api_response,
    },
};

use super::model::{
    EditRequest, EditResponse, LoginRequest, LoginResponse, LoginSmsRequest, ProfileResponse,
    SendSmsCodeRequest, SignupRequest, SignupResponse,
};

/// 签发令牌后通过 x-jwt-token 响应头带回，客户端后续
/// 用 Authorization: Bearer 重新提交
const TOKEN_HEADER: &str = "x-jwt-token";

fn fingerprint_from(headers: &HeaderMap) -> String {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    client_fingerprint(user_agent)
}

#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    if !is_valid_email(&req.email) {
        return (
            StatusCode::OK,
            error_to_api_response(error_codes::VALIDATION_ERROR, "邮箱不正确".to_string()),
        );
    }

    if req.password != req.confirm_password {
        return (
            StatusCode::OK,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "两次输入的密码不相同".to_string(),
            ),
        );
    }

    if !is_valid_password(&req.password) {
        return (
            StatusCode::OK,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "密码必须包含字母、数字、特殊字符，并且长度不能小于 8 位".to_string(),
            ),
        );
    }

    match state.service.signup(&req.email, &req.password).await {
        Ok(user_id) => (
            StatusCode::OK,
            success_to_api_response(SignupResponse { user_id }),
        ),
        Err(ServiceError::DuplicateEmail) => (
            StatusCode::OK,
            error_to_api_response(
                error_codes::USER_EXISTS,
                "重复邮箱，请换一个邮箱".to_string(),
            ),
        ),
        Err(e) => {
            tracing::error!("signup failed: {}", e);
            (
                StatusCode::OK,
                error_to_api_response(error_codes::INTERNAL_ERROR, "系统错误".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Response {
    let user = match state.service.login(&req.email, &req.password).await {
        Ok(user) => user,
        Err(ServiceError::InvalidCredentials) => {
            return (
                StatusCode::OK,
                error_to_api_response::<()>(
                    error_codes::AUTH_FAILED,
                    "用户名或者密码不正确，请重试".to_string(),
                ),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("login failed: {}", e);
            return internal_error();
        }
    };

    respond_with_token(&state, user.id, &headers, LoginResponse { user_id: user.id })
}

/// 发送短信验证码。验证码服务是外部协作方，这里保留原始
/// 实现的占位行为，只校验手机号非空。
#[axum::debug_handler]
pub async fn send_sms_code(
    State(_state): State<AppState>,
    Json(req): Json<SendSmsCodeRequest>,
) -> impl IntoResponse {
    if req.phone.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response(error_codes::VALIDATION_ERROR, "请输入手机号码".to_string()),
        );
    }

    (StatusCode::OK, success_to_api_response(()))
}

#[axum::debug_handler]
pub async fn login_sms(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginSmsRequest>,
) -> Response {
    if req.phone.is_empty() {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(error_codes::VALIDATION_ERROR, "请输入手机号码".to_string()),
        )
            .into_response();
    }

    // 验证码必须先通过，才允许登录或者注册
    if !state.verifier.verify_code(&req.phone, &req.code).await {
        return (
            StatusCode::OK,
            error_to_api_response::<()>(error_codes::AUTH_FAILED, "验证码有误".to_string()),
        )
            .into_response();
    }

    let user = match state.service.find_or_create(&req.phone).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("sms login failed: {}", e);
            return internal_error();
        }
    };

    respond_with_token(&state, user.id, &headers, LoginResponse { user_id: user.id })
}

#[axum::debug_handler]
pub async fn edit(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
    Json(req): Json<EditRequest>,
) -> impl IntoResponse {
    if req.nickname.chars().count() < 2 || req.nickname.chars().count() > 24 {
        return (
            StatusCode::OK,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "昵称长度必须在2到24个字符之间".to_string(),
            ),
        );
    }

    let birthday = match req.birthday.as_deref() {
        Some(s) => match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                return (
                    StatusCode::OK,
                    error_to_api_response(
                        error_codes::VALIDATION_ERROR,
                        "用户生日输入异常,请重试".to_string(),
                    ),
                );
            }
        },
        None => None,
    };

    let update = ProfileUpdate {
        nickname: req.nickname,
        profile: req.profile,
        birthday,
    };

    match state.service.edit(claims.sub, &update).await {
        Ok(()) => (StatusCode::OK, success_to_api_response(EditResponse {})),
        Err(ServiceError::NotFound) => (
            StatusCode::OK,
            error_to_api_response(error_codes::NOT_FOUND, "用户不存在".to_string()),
        ),
        Err(e) => {
            tracing::error!("edit failed for user {}: {}", claims.sub, e);
            (
                StatusCode::OK,
                error_to_api_response(error_codes::INTERNAL_ERROR, "系统错误".to_string()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn profile(
    Extension(claims): Extension<Claims>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.service.profile(claims.sub).await {
        Ok(user) => (
            StatusCode::OK,
            success_to_api_response(ProfileResponse {
                email: user.email,
                phone: user.phone,
                nickname: user.nickname,
                profile: user.profile,
                birthday: user.birthday,
            }),
        ),
        Err(e) => {
            // 令牌里的 id 对应的数据按道理一定存在，
            // 走到这里说明系统出了问题
            tracing::error!("profile lookup failed for user {}: {}", claims.sub, e);
            (
                StatusCode::OK,
                error_to_api_response(error_codes::INTERNAL_ERROR, "系统错误".to_string()),
            )
        }
    }
}

/// 登录成功后签发令牌并放进响应头
fn respond_with_token<T: serde::Serialize>(
    state: &AppState,
    user_id: i64,
    headers: &HeaderMap,
    body: T,
) -> Response {
    let fingerprint = fingerprint_from(headers);
    let now = chrono::Utc::now().timestamp();

    match state.issuer.issue(user_id, &fingerprint, now) {
        Ok(token) => (
            StatusCode::OK,
            [(TOKEN_HEADER, token)],
            success_to_api_response(body),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("token issuance failed for user {}: {}", user_id, e);
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::OK,
        error_to_api_response::<()>(error_codes::INTERNAL_ERROR, "系统错误".to_string()),
    )
        .into_response()
}
