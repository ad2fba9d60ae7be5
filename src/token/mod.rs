use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT 载荷。fp 绑定客户端指纹，被盗的令牌换个客户端就无法重放。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,  // 用户ID
    pub fp: String, // 客户端指纹
    pub iat: i64,  // 签发时间
    pub exp: i64,  // 过期时间
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("fingerprint mismatch")]
    FingerprintMismatch,
    #[error("invalid token")]
    Invalid,
    #[error("signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// 签发和校验会话令牌。密钥在启动时由配置注入，进程内不可变。
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    /// 签发绑定指纹的令牌，过期时间为 now + 固定有效期
    pub fn issue(&self, user_id: i64, fingerprint: &str, now: i64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id,
            fp: fingerprint.to_string(),
            iat: now,
            exp: now + self.lifetime.as_secs() as i64,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// 解码 + 验签 + 过期检查 + 指纹比对
    pub fn verify(&self, token: &str, fingerprint: &str, now: i64) -> Result<Claims, TokenError> {
        // 过期时间对照调用方给的 now 显式检查
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?
            .claims;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        if claims.fp != fingerprint {
            return Err(TokenError::FingerprintMismatch);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIFETIME: Duration = Duration::from_secs(30 * 60);

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", LIFETIME)
    }

    #[test]
    fn issued_token_verifies_with_same_fingerprint() {
        let issuer = issuer();
        let now = 1_700_000_000;

        let token = issuer.issue(42, "A", now).unwrap();
        let claims = issuer.verify(&token, "A", now + 1).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.fp, "A");
    }

    #[test]
    fn token_expires_after_lifetime() {
        let issuer = issuer();
        let now = 1_700_000_000;

        let token = issuer.issue(42, "A", now).unwrap();
        let expired = issuer.verify(&token, "A", now + LIFETIME.as_secs() as i64 + 1);
        assert!(matches!(expired, Err(TokenError::Expired)));
    }

    #[test]
    fn fingerprint_mismatch_is_rejected() {
        let issuer = issuer();
        let now = 1_700_000_000;

        let token = issuer.issue(42, "A", now).unwrap();
        let mismatch = issuer.verify(&token, "B", now + 1);
        assert!(matches!(mismatch, Err(TokenError::FingerprintMismatch)));
    }

    #[test]
    fn garbage_and_foreign_signatures_are_invalid() {
        let issuer = issuer();
        let now = 1_700_000_000;

        assert!(matches!(
            issuer.verify("not-a-token", "A", now),
            Err(TokenError::Invalid)
        ));

        let other = TokenIssuer::new("other-secret", LIFETIME);
        let token = other.issue(42, "A", now).unwrap();
        assert!(matches!(
            issuer.verify(&token, "A", now + 1),
            Err(TokenError::Invalid)
        ));
    }
}
