// ==========================================
// 化工设备参数可视化 - 身份API
// ==========================================
// 职责: 注册 / 登录 / 注销 / 令牌校验
// 口令: Argon2 哈希（随机盐）；令牌: UUID v4
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{AuthSession, UserAccount};
use crate::repository::{RepositoryError, UserRepository};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const MAX_USERNAME_LEN: usize = 150;

// ==========================================
// IdentityProvider - 令牌校验接口
// ==========================================
// HTTP 层只依赖此接口，测试可替换为固定实现
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 校验令牌，返回用户名
    async fn authenticate(&self, token: &str) -> ApiResult<String>;
}

/// 身份API
pub struct AuthApi {
    user_repo: Arc<UserRepository>,
}

impl AuthApi {
    pub fn new(user_repo: Arc<UserRepository>) -> Self {
        Self { user_repo }
    }

    /// 注册新用户并签发令牌
    pub fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> ApiResult<AuthSession> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(ApiError::InvalidInput(format!(
                "username must be at most {} characters",
                MAX_USERNAME_LEN
            )));
        }

        let account = UserAccount {
            username: username.to_string(),
            email: email.map(str::trim).filter(|e| !e.is_empty()).map(str::to_string),
            password_hash: hash_password(password)?,
            created_at: Utc::now().naive_utc(),
        };

        match self.user_repo.insert_user(&account) {
            Ok(()) => {}
            Err(RepositoryError::UniqueConstraintViolation(_)) => {
                return Err(ApiError::UsernameTaken)
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("用户已注册: username={}", username);
        self.issue_token(username)
    }

    /// 登录（用户名 + 口令）
    pub fn login(&self, username: &str, password: &str) -> ApiResult<AuthSession> {
        let username = username.trim();
        let account = self
            .user_repo
            .find_user(username)?
            .ok_or(ApiError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash) {
            tracing::info!("登录失败: username={}", username);
            return Err(ApiError::InvalidCredentials);
        }

        tracing::info!("登录成功: username={}", username);
        self.issue_token(username)
    }

    /// 注销（吊销令牌，重复调用无副作用）
    pub fn logout(&self, token: &str) -> ApiResult<()> {
        let removed = self.user_repo.delete_token(token)?;
        tracing::debug!("令牌吊销: removed={}", removed);
        Ok(())
    }

    fn issue_token(&self, username: &str) -> ApiResult<AuthSession> {
        let token = Uuid::new_v4().simple().to_string();
        self.user_repo
            .insert_token(&token, username, Utc::now().naive_utc())?;
        Ok(AuthSession {
            token,
            username: username.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for AuthApi {
    /// SQLite 查询放到阻塞线程池，不占用 runtime 工作线程
    async fn authenticate(&self, token: &str) -> ApiResult<String> {
        if token.is_empty() {
            return Err(ApiError::Unauthorized);
        }

        let user_repo = self.user_repo.clone();
        let token = token.to_string();
        let username = tokio::task::spawn_blocking(move || user_repo.find_username_by_token(&token))
            .await
            .map_err(|e| ApiError::InternalError(format!("token lookup task failed: {}", e)))??;

        username.ok_or(ApiError::Unauthorized)
    }
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::InternalError(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("口令哈希无法解析: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::sync::Mutex;
    use std::time::Duration;

    fn setup_shared() -> (AuthApi, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let api = AuthApi::new(Arc::new(UserRepository::new(conn.clone())));
        (api, conn)
    }

    fn setup_api() -> AuthApi {
        setup_shared().0
    }

    #[tokio::test]
    async fn test_register_login_logout_cycle() {
        let api = setup_api();

        let session = api.register("operator", "s3cret", Some("op@plant.local")).unwrap();
        assert_eq!(session.username, "operator");
        assert_eq!(api.authenticate(&session.token).await.unwrap(), "operator");

        let second = api.login("operator", "s3cret").unwrap();
        assert_ne!(second.token, session.token);

        api.logout(&session.token).unwrap();
        api.logout(&session.token).unwrap();
        assert!(matches!(
            api.authenticate(&session.token).await,
            Err(ApiError::Unauthorized)
        ));
        // 其他令牌不受影响
        assert_eq!(api.authenticate(&second.token).await.unwrap(), "operator");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_authenticate_waits_off_the_runtime_thread() {
        let (api, conn) = setup_shared();
        let session = api.register("operator", "s3cret", None).unwrap();

        // 另一线程持有连接锁 300ms
        let (locked_tx, locked_rx) = std::sync::mpsc::channel();
        let holder = std::thread::spawn(move || {
            let _guard = conn.lock().unwrap();
            locked_tx.send(()).unwrap();
            std::thread::sleep(Duration::from_millis(300));
        });
        locked_rx.recv().unwrap();

        // 单线程 runtime 上，等锁期间定时任务仍应先完成
        let order = Mutex::new(Vec::new());
        let auth = async {
            let username = api.authenticate(&session.token).await.unwrap();
            order.lock().unwrap().push(username);
        };
        let tick = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            order.lock().unwrap().push("tick".to_string());
        };
        tokio::join!(auth, tick);
        holder.join().unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["tick".to_string(), "operator".to_string()]);
    }

    #[test]
    fn test_wrong_password_and_unknown_user() {
        let api = setup_api();
        api.register("operator", "s3cret", None).unwrap();

        assert!(matches!(
            api.login("operator", "wrong"),
            Err(ApiError::InvalidCredentials)
        ));
        assert!(matches!(
            api.login("ghost", "s3cret"),
            Err(ApiError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_duplicate_and_blank_registration() {
        let api = setup_api();
        api.register("operator", "s3cret", None).unwrap();

        assert!(matches!(
            api.register("operator", "other", None),
            Err(ApiError::UsernameTaken)
        ));
        assert!(matches!(
            api.register("  ", "pw", None),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            api.register("someone", "", None),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_password_hash_is_not_plaintext() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("s3cret", "not-a-hash"));
    }
}
