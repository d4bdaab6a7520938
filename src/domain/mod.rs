// ==========================================
// 化工设备参数可视化 - 领域层
// ==========================================
// 职责: 定义读数/统计摘要/用户等领域实体
// 约束: 领域层不依赖数据库与 HTTP
// ==========================================

pub mod dataset;
pub mod equipment;
pub mod types;
pub mod user;

// 重导出核心类型
pub use dataset::{DatasetRecord, DatasetSummary, TypeCount, TypeDistribution};
pub use equipment::{EquipmentReading, REQUIRED_COLUMNS};
pub use types::FileFormat;
pub use user::{AuthSession, UserAccount};
