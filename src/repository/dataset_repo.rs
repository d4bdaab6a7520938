// ==========================================
// 化工设备参数可视化 - 数据集仓储
// ==========================================
// 对齐: dataset 表
// 红线: 只提供 create / get / recent，无更新、无删除
// ==========================================

mod core;
mod queries;


pub use core::DatasetRepository;
