// ==========================================
// 化工设备参数可视化 - 身份领域模型
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// UserAccount - 用户账号
// ==========================================
// 口令只以 Argon2 PHC 字符串形式保存
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

// ==========================================
// AuthSession - 登录/注册成功后的返回体
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub username: String,
}
