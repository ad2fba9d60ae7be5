use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SendSmsCodeRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginSmsRequest {
    pub phone: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub nickname: String,
    pub profile: String,
    pub birthday: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nickname: String,
    pub profile: String,
    pub birthday: Option<NaiveDate>,
}
