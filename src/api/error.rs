// ==========================================
// 化工设备参数可视化 - API层错误类型
// ==========================================
// 职责: 汇总导入/仓储/报表错误，转换为对外稳定的错误消息与错误码
// 约束: 消息文本属于 HTTP 契约，客户端按原文展示
// ==========================================

use crate::importer::ImportError;
use crate::report::ReportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 上传错误
    // ==========================================
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("Only CSV or Excel files allowed")]
    UnsupportedFormat,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumn(Vec<String>),

    #[error("{0}")]
    InvalidData(String),

    #[error("File contains no data rows")]
    EmptyDataset,

    // ==========================================
    // 资源错误
    // ==========================================
    #[error("Dataset not found")]
    DatasetNotFound,

    // ==========================================
    // 身份错误
    // ==========================================
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Authentication credentials were not provided or are invalid")]
    Unauthorized,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ==========================================
    // 基础设施错误
    // ==========================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Report rendering failed: {0}")]
    ReportRenderError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 稳定的机器可读错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NoFileUploaded => "NO_FILE_UPLOADED",
            ApiError::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            ApiError::MissingColumn(_) => "MISSING_COLUMN",
            ApiError::InvalidData(_) => "INVALID_DATA",
            ApiError::EmptyDataset => "EMPTY_DATASET",
            ApiError::DatasetNotFound => "DATASET_NOT_FOUND",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::UsernameTaken => "USERNAME_TAKEN",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::ReportRenderError(_) => "REPORT_RENDER_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnsupportedFormat(_) => ApiError::UnsupportedFormat,
            ImportError::MissingColumn { columns } => ApiError::MissingColumn(columns),
            ImportError::DuplicateColumn { columns } => {
                ApiError::InvalidData(format!("Duplicate columns: {}", columns.join(", ")))
            }
            ImportError::InvalidNumber { row, column, value } => ApiError::InvalidData(format!(
                "Invalid numeric value '{}' in column {} at row {}",
                value, column, row
            )),
            ImportError::MissingValue { row, column } => ApiError::InvalidData(format!(
                "Missing value in column {} at row {}",
                column, row
            )),
            ImportError::EmptyDataset => ApiError::EmptyDataset,
            ImportError::NonFiniteMean { column } => ApiError::InvalidData(format!(
                "Average of column {} is outside the representable numeric range",
                column
            )),
            ImportError::FileReadError(msg)
            | ImportError::ExcelParseError(msg)
            | ImportError::CsvParseError(msg) => {
                ApiError::InvalidData(format!("Could not read uploaded file: {}", msg))
            }
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, .. } if entity == "Dataset" => {
                ApiError::DatasetNotFound
            }
            RepositoryError::NotFound { entity, id } => {
                ApiError::InvalidInput(format!("{}(id={}) does not exist", entity, id))
            }
            RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg) => ApiError::DatabaseError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("connection lock poisoned: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("corrupt field {}: {}", field, message))
            }
        }
    }
}

// ==========================================
// 从 ReportError 转换
// ==========================================
impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::ReportRenderError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
