// ==========================================
// 化工设备参数可视化 - 核心库
// ==========================================
// 技术栈: axum + Rust + SQLite
// 系统定位: 上传设备参数表 -> 统计摘要 -> 历史 / 报表
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 表格解析
pub mod importer;

// 引擎层 - 统计聚合
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 报表层 - PDF 渲染
pub mod report;

// 配置层 - 运行参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 服务
pub mod app;

// 客户端 - 终端外壳
pub mod client;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{DatasetRecord, DatasetSummary, EquipmentReading, FileFormat, TypeDistribution};
pub use engine::SummaryAggregator;
pub use importer::EquipmentIngestor;
pub use api::{ApiError, AuthApi, DatasetApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Chemical Equipment Parameter Visualizer";
