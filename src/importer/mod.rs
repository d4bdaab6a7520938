// ==========================================
// 化工设备参数可视化 - 导入层
// ==========================================
// 职责: 上传文件 -> 设备读数
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

pub mod equipment_ingestor;
pub mod error;
pub mod file_parser;
pub mod reading_mapper;

// 重导出核心类型
pub use equipment_ingestor::EquipmentIngestor;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, RawTable, UniversalFileParser};
pub use reading_mapper::ReadingMapper;
