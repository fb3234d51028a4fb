//! Authorization gate / 权限检查
//!
//! Session handling lives outside this service; requests only carry an
//! opaque session cookie which is handed to the configured `Authorizer`.

use async_trait::async_trait;
use tower_cookies::Cookies;

/// Session cookie name / 会话 Cookie 名称
pub const SESSION_COOKIE_NAME: &str = "session_token";

/// Caller identity / 调用者身份
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    /// Opaque session token, None for guests / 会话令牌
    pub session: Option<String>,
}

impl UserContext {
    pub fn guest() -> Self {
        Self { session: None }
    }
}

/// Actions guarded by the gate / 需要授权的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Search note names and contents / 搜索
    Search,
    /// List notebook children / 列出笔记本
    ListNotebook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Capability check invoked before search / 授权接口
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, user: &UserContext, action: Action) -> Decision;
}

/// Allows every request / 允许所有请求
#[derive(Debug, Clone, Default)]
pub struct AllowAll;

#[async_trait]
impl Authorizer for AllowAll {
    async fn authorize(&self, _user: &UserContext, _action: Action) -> Decision {
        Decision::Allow
    }
}

/// Extract the caller from the session cookie / 从 Cookie 中提取调用者
pub fn get_user_context(cookies: &Cookies) -> UserContext {
    match cookies.get(SESSION_COOKIE_NAME) {
        Some(c) if !c.value().is_empty() => UserContext {
            session: Some(c.value().to_string()),
        },
        _ => UserContext::guest(),
    }
}
