// ==========================================
// 化工设备参数可视化 - 设备读数领域模型
// ==========================================
// 来源: 上传表格中的一行
// ==========================================

use serde::{Deserialize, Serialize};

/// 设备类型列
pub const COLUMN_TYPE: &str = "Type";
/// 流量列
pub const COLUMN_FLOWRATE: &str = "Flowrate";
/// 压力列
pub const COLUMN_PRESSURE: &str = "Pressure";
/// 温度列
pub const COLUMN_TEMPERATURE: &str = "Temperature";

/// 上传表格必须包含的列（顺序即报错顺序）
pub const REQUIRED_COLUMNS: [&str; 4] = [
    COLUMN_TYPE,
    COLUMN_FLOWRATE,
    COLUMN_PRESSURE,
    COLUMN_TEMPERATURE,
];

// ==========================================
// EquipmentReading - 单台设备读数
// ==========================================
// 不变量: 数值字段均为有限数（由 ReadingMapper 保证）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentReading {
    pub row_number: usize,       // 源文件中的数据行号（从 1 开始，不含表头）
    pub equipment_type: String,  // Type
    pub flowrate: f64,           // Flowrate
    pub pressure: f64,           // Pressure
    pub temperature: f64,        // Temperature
}
