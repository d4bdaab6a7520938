// ==========================================
// 化工设备参数可视化 - API 层
// ==========================================
// 职责: 业务接口，HTTP 层与客户端外壳之下的唯一入口
// 约束: 不感知传输协议（状态码/附件头由 app 层负责）
// ==========================================

pub mod auth_api;
pub mod dataset_api;
pub mod error;

pub use auth_api::{AuthApi, IdentityProvider};
pub use dataset_api::{DatasetApi, ReportFile};
pub use error::{ApiError, ApiResult};
