// ==========================================
// 化工设备参数可视化 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};
use rusqlite::Connection;

use crate::api::{AuthApi, DatasetApi, IdentityProvider};
use crate::config::AppConfig;
use crate::repository::{DatasetRepository, UserRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
/// 在 HTTP 服务中作为 axum State 共享
#[derive(Clone)]
pub struct AppState {
    /// 运行配置
    pub config: Arc<AppConfig>,

    /// 数据集API（上传/历史/报表）
    pub dataset_api: Arc<DatasetApi>,

    /// 身份API（注册/登录/注销）
    pub auth_api: Arc<AuthApi>,

    /// 令牌校验（默认即 auth_api）
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - config: 服务端配置（含数据库路径）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(config: AppConfig) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", config.db_path);

        let conn = crate::db::open_sqlite_connection(&config.db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        Self::from_connection(config, conn)
    }

    /// 基于已打开的连接创建（测试可使用内存库）
    pub fn from_connection(config: AppConfig, conn: Connection) -> Result<Self, String> {
        // 拒绝由更新版本程序写入的数据库
        let found = crate::db::read_schema_version(&conn)
            .map_err(|e| format!("无法读取 schema_version: {}", e))?;
        if let Some(version) = found.filter(|v| *v > crate::db::CURRENT_SCHEMA_VERSION) {
            return Err(format!(
                "数据库 schema_version={} 高于当前程序支持的版本 {}",
                version,
                crate::db::CURRENT_SCHEMA_VERSION
            ));
        }

        crate::db::ensure_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        tracing::debug!("数据库 schema 就绪: previous_version={:?}", found);
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let dataset_repo = Arc::new(DatasetRepository::new(conn.clone()));
        let user_repo = Arc::new(UserRepository::new(conn));

        // ==========================================
        // 初始化API层
        // ==========================================
        let dataset_api = Arc::new(DatasetApi::new(dataset_repo, config.history_limit));
        let auth_api = Arc::new(AuthApi::new(user_repo));
        let identity: Arc<dyn IdentityProvider> = auth_api.clone();

        tracing::info!(
            "AppState初始化完成: history_limit={}, max_upload_bytes={}",
            config.history_limit,
            config.max_upload_bytes
        );

        Ok(Self {
            config: Arc::new(config),
            dataset_api,
            auth_api,
            identity,
        })
    }
}
