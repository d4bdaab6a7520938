// ==========================================
// 化工设备参数可视化 - 客户端错误类型
// ==========================================
// 约束: 每个变体的 user_message 可区分（离线 / 超时 / 响应异常 / 被拒绝）
// ==========================================

use crate::report::ReportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection refused: {url}")]
    ConnectionRefused { url: String },

    #[error("request timed out: {url}")]
    Timeout { url: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("not logged in")]
    NotLoggedIn,

    #[error("unknown dataset id {0}")]
    UnknownDataset(i64),

    #[error("report error: {0}")]
    Report(#[from] ReportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// reqwest 错误分类
    pub fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
            }
        } else if err.is_connect() {
            ClientError::ConnectionRefused {
                url: url.to_string(),
            }
        } else if err.is_decode() || err.is_body() {
            ClientError::MalformedResponse(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }

    /// 终端展示文本
    pub fn user_message(&self) -> String {
        match self {
            ClientError::ConnectionRefused { url } => {
                format!("Server is offline or unreachable ({}).", url)
            }
            ClientError::Timeout { url } => {
                format!("The server did not respond in time ({}).", url)
            }
            ClientError::Transport(msg) => format!("Network error: {}", msg),
            ClientError::MalformedResponse(msg) => {
                format!("The server sent a response that could not be understood: {}", msg)
            }
            ClientError::Unauthorized(msg) => {
                format!("Not authorized: {}. Please log in again.", msg)
            }
            ClientError::Server { status, message } => {
                format!("Rejected by server (HTTP {}): {}", status, message)
            }
            ClientError::NotLoggedIn => "Please log in first.".to_string(),
            ClientError::UnknownDataset(id) => format!(
                "Unknown dataset id {}. Run `history` to list datasets known to the server.",
                id
            ),
            ClientError::Report(e) => format!("Could not render report: {}", e),
            ClientError::Io(e) => format!("File error: {}", e),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
