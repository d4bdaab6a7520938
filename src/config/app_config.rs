// ==========================================
// 化工设备参数可视化 - 服务端配置
// ==========================================
// CHEM_EQUIPMENT_BIND           监听地址（默认 127.0.0.1:8000）
// CHEM_EQUIPMENT_DB_PATH        数据库文件（默认用户数据目录）
// CHEM_EQUIPMENT_HISTORY_LIMIT  历史条数上限（默认 5，范围 1..=50）
// CHEM_EQUIPMENT_MAX_UPLOAD_MB  上传大小上限（默认 10）
// CHEM_EQUIPMENT_LOG_FORMAT     text | json
// ==========================================

use crate::config::env::{read_parsed, read_string, EnvLookup, ProcessEnv};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_BIND: &str = "CHEM_EQUIPMENT_BIND";
pub const ENV_DB_PATH: &str = "CHEM_EQUIPMENT_DB_PATH";
pub const ENV_HISTORY_LIMIT: &str = "CHEM_EQUIPMENT_HISTORY_LIMIT";
pub const ENV_MAX_UPLOAD_MB: &str = "CHEM_EQUIPMENT_MAX_UPLOAD_MB";
pub const ENV_LOG_FORMAT: &str = "CHEM_EQUIPMENT_LOG_FORMAT";

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_HISTORY_LIMIT: usize = 5;
pub const MAX_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {}", other)),
        }
    }
}

/// 服务端配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub db_path: String,
    pub history_limit: usize,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// 从进程环境变量读取
    pub fn from_env() -> Self {
        Self::from_lookup(&ProcessEnv)
    }

    pub fn from_lookup(env: &dyn EnvLookup) -> Self {
        let default_bind: SocketAddr = ([127, 0, 0, 1], 8000).into();
        let bind_addr = read_parsed(env, ENV_BIND, default_bind);

        let db_path = read_string(env, ENV_DB_PATH).unwrap_or_else(get_default_db_path);

        let history_limit = read_parsed(env, ENV_HISTORY_LIMIT, DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);

        let max_upload_mb = read_parsed(env, ENV_MAX_UPLOAD_MB, DEFAULT_MAX_UPLOAD_MB).max(1);

        Self {
            bind_addr,
            db_path,
            history_limit,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            log_format: read_parsed(env, ENV_LOG_FORMAT, LogFormat::Text),
        }
    }

    /// 指定数据库路径，其余取默认值（测试/嵌入场景）
    pub fn with_db_path(db_path: impl Into<String>) -> Self {
        let db_path: String = db_path.into();
        let env = move |key: &str| -> Option<String> { (key == ENV_DB_PATH).then(|| db_path.clone()) };
        Self::from_lookup(&env)
    }
}

/// 默认数据库路径
///
/// 优先使用用户数据目录（chem-equipment/chem_equipment.db），
/// 无法获取时回退到当前目录
pub fn get_default_db_path() -> String {
    let mut path = PathBuf::from("./chem_equipment.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("chem-equipment");
        // 目录创建失败时仍返回路径，由打开数据库时报错
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("无法创建数据目录 {}: {}", dir.display(), e);
        }
        path = dir.join("chem_equipment.db");
    }

    path.to_string_lossy().to_string()
}
