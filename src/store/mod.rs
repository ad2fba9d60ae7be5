mod postgres;

pub use postgres::PgUserStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{NewUser, ProfileUpdate, User};

/// 触发唯一约束的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Email,
    Phone,
}

impl std::fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DuplicateField::Email => write!(f, "email"),
            DuplicateField::Phone => write!(f, "phone"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {0}")]
    Duplicate(DuplicateField),
    #[error("user not found")]
    NotFound,
    #[error("store call timed out")]
    Timeout,
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// 持久存储契约。Insert 必须报告具体撞上了哪个唯一字段，
/// FindOrCreate 的竞争恢复依赖这个信号。
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<User, StoreError>;
    async fn find_by_phone(&self, phone: &str) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<User, StoreError>;
    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<(), StoreError>;
}
