mod redis;

pub use redis::RedisUserCache;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::User;

/// 用户信息缓存键前缀
const USER_INFO_PREFIX: &str = "user:info:";

/// 生成用户信息缓存键
pub fn user_info_key(id: i64) -> String {
    format!("{}{}", USER_INFO_PREFIX, id)
}

/// 缓存不可用。调用方不得把它当作未命中处理，
/// 必须直接落到持久存储上。
#[derive(Debug, Error)]
#[error("cache unavailable: {0}")]
pub struct CacheUnavailable(pub String);

/// 临时缓存契约。`Ok(None)` 表示未命中，`Err` 表示缓存不可用。
#[async_trait]
pub trait UserCache: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<User>, CacheUnavailable>;
    async fn set(&self, user: &User, ttl: Duration) -> Result<(), CacheUnavailable>;
    async fn delete(&self, id: i64) -> Result<(), CacheUnavailable>;
}
