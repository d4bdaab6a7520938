// ==========================================
// 化工设备参数可视化 - 配置层
// ==========================================
// 来源: 环境变量（CHEM_EQUIPMENT_*）
// 职责: 服务端与客户端运行参数
// ==========================================

pub mod app_config;
pub mod client_config;
pub mod env;

// 重导出
pub use app_config::{get_default_db_path, AppConfig, LogFormat};
pub use client_config::ClientConfig;
pub use env::{EnvLookup, ProcessEnv};
