use std::sync::Arc;
use std::time::Duration;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::{CacheUnavailable, UserCache, user_info_key};
use crate::domain::User;

/// 用户缓存的 Redis 实现
#[derive(Clone)]
pub struct RedisUserCache {
    redis: Arc<RedisClient>,
}

impl RedisUserCache {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, CacheUnavailable> {
        self.redis
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheUnavailable(e.to_string()))
    }
}

#[async_trait::async_trait]
impl UserCache for RedisUserCache {
    async fn get(&self, id: i64) -> Result<Option<User>, CacheUnavailable> {
        let mut conn = self.connection().await?;

        let result: Option<String> = conn
            .get(user_info_key(id))
            .await
            .map_err(|e| CacheUnavailable(e.to_string()))?;

        match result {
            Some(json) => {
                // 反序列化失败按照损坏条目处理，等同于未命中
                match serde_json::from_str(&json) {
                    Ok(user) => Ok(Some(user)),
                    Err(e) => {
                        tracing::warn!("discarding corrupt cache entry for user {}: {}", id, e);
                        Ok(None)
                    }
                }
            }
            None => Ok(None),
        }
    }

    async fn set(&self, user: &User, ttl: Duration) -> Result<(), CacheUnavailable> {
        let mut conn = self.connection().await?;

        let json = serde_json::to_string(user).map_err(|e| CacheUnavailable(e.to_string()))?;
        let _: () = conn
            .set_ex(user_info_key(user.id), json, ttl.as_secs())
            .await
            .map_err(|e| CacheUnavailable(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), CacheUnavailable> {
        let mut conn = self.connection().await?;

        let _: () = conn
            .del(user_info_key(id))
            .await
            .map_err(|e| CacheUnavailable(e.to_string()))?;

        Ok(())
    }
}
