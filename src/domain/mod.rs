use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 用户领域对象，Postgres 是唯一权威来源
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub nickname: String,
    pub profile: String,
    pub birthday: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// 新建用户时的输入，id 和 created_at 由存储层分配
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
}

impl NewUser {
    pub fn with_email(email: String, password_hash: String) -> Self {
        Self {
            email: Some(email),
            password_hash: Some(password_hash),
            ..Default::default()
        }
    }

    pub fn with_phone(phone: String) -> Self {
        Self {
            phone: Some(phone),
            ..Default::default()
        }
    }
}

/// Edit 接口允许修改的字段
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub nickname: String,
    pub profile: String,
    pub birthday: Option<NaiveDate>,
}
