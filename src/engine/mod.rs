// ==========================================
// 化工设备参数可视化 - 引擎层
// ==========================================
// 职责: 实现统计规则,不拼 SQL
// 红线: Engine 不访问数据库
// ==========================================

pub mod aggregator;

// 重导出核心引擎
pub use aggregator::{round2, SummaryAggregator};
