// ==========================================
// 化工设备参数可视化 - 客户端配置
// ==========================================

use crate::config::env::{read_parsed, read_string, EnvLookup, ProcessEnv};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_URL: &str = "CHEM_EQUIPMENT_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "CHEM_EQUIPMENT_TIMEOUT_SECS";
pub const ENV_REPORT_DIR: &str = "CHEM_EQUIPMENT_REPORT_DIR";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// 客户端配置
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API 基地址（不含末尾斜杠）
    pub api_url: String,
    pub timeout: Duration,
    /// 报表默认保存目录
    pub report_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(&ProcessEnv)
    }

    pub fn from_lookup(env: &dyn EnvLookup) -> Self {
        let api_url = read_string(env, ENV_API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout_secs = read_parsed(env, ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS).max(1);
        let report_dir = read_string(env, ENV_REPORT_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
            report_dir,
        }
    }

    /// 指定 API 地址，其余取默认值
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        let none = |_: &str| -> Option<String> { None };
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            ..Self::from_lookup(&none)
        }
    }
}
