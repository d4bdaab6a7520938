// ==========================================
// 化工设备参数可视化 - 终端客户端
// ==========================================
// 职责: 登录 / 上传 / 历史 / 仪表盘 / 报表下载与本地渲染
// 约束: 只通过 HTTP 接口访问服务端
// ==========================================

pub mod api_client;
pub mod error;
pub mod session;
pub mod shell;
pub mod view_model;

pub use api_client::{EquipmentApi, HttpEquipmentApi};
pub use error::{ClientError, ClientResult};
pub use session::Session;
pub use shell::{Flow, Shell};
pub use view_model::{DashboardView, HistoryEntry, HistoryRow};
