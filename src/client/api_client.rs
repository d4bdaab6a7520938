// ==========================================
// 化工设备参数可视化 - HTTP 客户端
// ==========================================
// 传输: reqwest blocking（终端外壳为同步交互）
// 鉴权: Session 显式传入，Authorization: Bearer <token>
// ==========================================

use crate::client::error::{ClientError, ClientResult};
use crate::client::session::Session;
use crate::client::view_model::HistoryEntry;
use crate::config::ClientConfig;
use crate::domain::AuthSession;
use reqwest::blocking::{multipart, Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::path::Path;

const MAX_ERROR_TEXT: usize = 200;

// ==========================================
// EquipmentApi - 外壳依赖的服务接口
// ==========================================
pub trait EquipmentApi {
    fn register(&self, username: &str, password: &str, email: Option<&str>) -> ClientResult<Session>;

    fn login(&self, username: &str, password: &str) -> ClientResult<Session>;

    fn logout(&self, session: &Session) -> ClientResult<()>;

    fn upload(&self, session: &Session, path: &Path) -> ClientResult<HistoryEntry>;

    fn history(&self, session: &Session) -> ClientResult<Vec<HistoryEntry>>;

    /// 服务端渲染的报表 PDF
    fn download_report(&self, session: &Session, dataset_id: i64) -> ClientResult<Vec<u8>>;
}

/// 基于 HTTP 的实现
pub struct HttpEquipmentApi {
    client: Client,
    base_url: String,
}

impl HttpEquipmentApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("chem-equipment-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// 发送请求并按状态码分类错误
    fn send(&self, request: RequestBuilder, url: &str) -> ClientResult<Response> {
        let response = request
            .send()
            .map_err(|e| ClientError::from_reqwest(e, url))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = error_message(status, response.text().unwrap_or_default());
        tracing::debug!("请求被拒绝: url={}, status={}, message={}", url, status, message);

        if status == StatusCode::UNAUTHORIZED {
            Err(ClientError::Unauthorized(message))
        } else {
            Err(ClientError::Server {
                status: status.as_u16(),
                message,
            })
        }
    }

    fn authenticate(&self, path: &str, body: serde_json::Value) -> ClientResult<Session> {
        let url = self.url(path);
        let response = self.send(self.client.post(&url).json(&body), &url)?;
        let auth: AuthSession = decode_json(response)?;
        Ok(Session::new(self.base_url.clone(), auth))
    }
}

impl EquipmentApi for HttpEquipmentApi {
    fn register(&self, username: &str, password: &str, email: Option<&str>) -> ClientResult<Session> {
        self.authenticate(
            "register",
            serde_json::json!({ "username": username, "password": password, "email": email }),
        )
    }

    fn login(&self, username: &str, password: &str) -> ClientResult<Session> {
        self.authenticate(
            "login",
            serde_json::json!({ "username": username, "password": password }),
        )
    }

    fn logout(&self, session: &Session) -> ClientResult<()> {
        let url = session.endpoint("logout");
        self.send(
            self.client
                .post(&url)
                .header(AUTHORIZATION, session.authorization()),
            &url,
        )?;
        Ok(())
    }

    fn upload(&self, session: &Session, path: &Path) -> ClientResult<HistoryEntry> {
        let url = session.endpoint("upload");
        let form = multipart::Form::new().file("file", path)?;
        let response = self.send(
            self.client
                .post(&url)
                .header(AUTHORIZATION, session.authorization())
                .multipart(form),
            &url,
        )?;
        decode_json(response)
    }

    fn history(&self, session: &Session) -> ClientResult<Vec<HistoryEntry>> {
        let url = session.endpoint("history");
        let response = self.send(
            self.client
                .get(&url)
                .header(AUTHORIZATION, session.authorization()),
            &url,
        )?;
        decode_json(response)
    }

    fn download_report(&self, session: &Session, dataset_id: i64) -> ClientResult<Vec<u8>> {
        let url = session.endpoint(&format!("report/{}", dataset_id));
        let response = self.send(
            self.client
                .get(&url)
                .header(AUTHORIZATION, session.authorization()),
            &url,
        )?;

        let bytes = response
            .bytes()
            .map_err(|e| ClientError::from_reqwest(e, &url))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(ClientError::MalformedResponse(
                "report body is not a PDF document".to_string(),
            ));
        }
        Ok(bytes.to_vec())
    }
}

fn decode_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let text = response
        .text()
        .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| ClientError::MalformedResponse(e.to_string()))
}

/// 错误体提取: {"error": ...} / {"detail": ...} / 原文
fn error_message(status: StatusCode, body: String) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        for key in ["error", "detail"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_TEXT).collect()
    }
}
