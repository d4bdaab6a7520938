// ==========================================
// 化工设备参数可视化 - 报表错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("PDF 生成失败: {0}")]
    PdfError(String),
}

impl From<lopdf::Error> for ReportError {
    fn from(err: lopdf::Error) -> Self {
        ReportError::PdfError(err.to_string())
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::PdfError(err.to_string())
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
