// ==========================================
// 化工设备参数可视化 - 客户端会话
// ==========================================
// 登录创建，显式传入每次调用；注销即丢弃
// ==========================================

use crate::domain::AuthSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    base_url: String,
    token: String,
    username: String,
}

impl Session {
    pub fn new(base_url: impl Into<String>, auth: AuthSession) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: auth.token,
            username: auth.username,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// 接口地址
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Authorization 头取值
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}
