use axum::Json;
use bcrypt::{DEFAULT_COST, hash, verify};
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), DEFAULT_COST)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// 客户端指纹：User-Agent 的 SHA-256 十六进制摘要
pub fn client_fingerprint(user_agent: &str) -> String {
    let digest = Sha256::digest(user_agent.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// 邮箱格式检查，对应原始实现的正则校验
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    let (name, tld) = match domain.rsplit_once('.') {
        Some(parts) => parts,
        None => return false,
    };
    if name.is_empty() || tld.is_empty() {
        return false;
    }
    email
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '-' | '+' | '_'))
}

/// 密码必须包含字母、数字、特殊字符，长度不小于 8 位
pub fn is_valid_password(password: &str) -> bool {
    const SPECIALS: &str = "$@!%*#?&";
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIALS.contains(c))
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || SPECIALS.contains(c))
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: 0,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const USER_EXISTS: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const UNAUTHENTICATED: i32 = 1003;
    pub const NOT_FOUND: i32 = 1004;
    pub const INTERNAL_ERROR: i32 = 5000;
}
