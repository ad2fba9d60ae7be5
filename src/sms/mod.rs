use async_trait::async_trait;

/// 短信验证码校验的外部协作方。手机号登录在调用
/// find_or_create 之前必须先通过这里。
#[async_trait]
pub trait CodeVerifier: Send + Sync {
    async fn verify_code(&self, phone: &str, code: &str) -> bool;
}

/// 占位实现，接受任何验证码。
/// TODO: 接入真实短信服务后替换掉。
pub struct NoopCodeVerifier;

#[async_trait]
impl CodeVerifier for NoopCodeVerifier {
    async fn verify_code(&self, _phone: &str, _code: &str) -> bool {
        true
    }
}
