// ==========================================
// 化工设备参数可视化 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 任何导入/聚合错误都发生在写库之前
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 数据结构错误 =====
    #[error("缺少必需列: {}", .columns.join(", "))]
    MissingColumn { columns: Vec<String> },

    #[error("必需列重复: {}", .columns.join(", "))]
    DuplicateColumn { columns: Vec<String> },

    // ===== 数据质量错误 =====
    #[error("数值格式错误 (行 {row}, 字段 {column}): {value}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("字段为空 (行 {row}, 字段 {column})")]
    MissingValue { row: usize, column: String },

    #[error("文件不含任何数据行")]
    EmptyDataset,

    #[error("均值超出数值范围 (字段 {column})")]
    NonFiniteMean { column: String },
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsError>
impl From<calamine::XlsError> for ImportError {
    fn from(err: calamine::XlsError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
