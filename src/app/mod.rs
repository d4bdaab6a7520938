// ==========================================
// 化工设备参数可视化 - 应用层
// ==========================================
// 职责: 组装共享状态，对外提供 HTTP 服务
// ==========================================

pub mod http;
pub mod state;

// 重导出
pub use http::{build_router, serve, ErrorBody};
pub use state::AppState;
