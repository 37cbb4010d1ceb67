use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

use engine_logging::engine_debug;

use crate::types::{
    AnalyzeResponse, PreviewKind, PreviewResponse, StatusResponse, TerminologyResponse,
    TranslateResponse, UploadResponse,
};

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Uploads and downloads move whole documents and get a longer budget.
    pub transfer_timeout: Duration,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            transfer_timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    /// Non-success HTTP status. `message` is the server's error text when it
    /// sent one.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// A downloaded result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Name from the `Content-Disposition` header, if any.
    pub filename: Option<String>,
    pub bytes: Bytes,
}

#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, BackendError>;

    async fn analyze(&self, task_id: &str, language: &str) -> Result<AnalyzeResponse, BackendError>;

    async fn start_translation(
        &self,
        task_id: &str,
        use_terminology: bool,
    ) -> Result<TranslateResponse, BackendError>;

    async fn preview(&self, task_id: &str, kind: PreviewKind) -> Result<PreviewResponse, BackendError>;

    async fn download(&self, task_id: &str) -> Result<DownloadedFile, BackendError>;

    async fn terminology(&self) -> Result<TerminologyResponse, BackendError>;

    async fn status(&self, task_id: &str) -> Result<StatusResponse, BackendError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|err| BackendError::InvalidUrl(err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| BackendError::Network(err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Append `segments` to the base path. Each segment is percent-encoded,
    /// so ids cannot add path levels or a query.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(format!("{} cannot be a base", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        action: &str,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        engine_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(check_status(response, action).await?).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: serde_json::Value,
        action: &str,
    ) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        engine_debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .timeout(self.settings.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(check_status(response, action).await?).await
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadResponse, BackendError> {
        let url = self.endpoint(&["api", "upload"])?;
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("text/markdown")
            .map_err(|err| BackendError::Network(err.to_string()))?;
        let form = Form::new().part("file", part);
        engine_debug!("POST {} ({})", url, filename);
        let response = self
            .client
            .post(url)
            .timeout(self.settings.transfer_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        decode_json(check_status(response, "Upload").await?).await
    }

    async fn analyze(&self, task_id: &str, language: &str) -> Result<AnalyzeResponse, BackendError> {
        self.post_json(
            &["api", "analyze", task_id],
            json!({ "language": language }),
            "Analysis",
        )
        .await
    }

    async fn start_translation(
        &self,
        task_id: &str,
        use_terminology: bool,
    ) -> Result<TranslateResponse, BackendError> {
        self.post_json(
            &["api", "translate", task_id],
            json!({ "use_terminology": use_terminology }),
            "Translation start",
        )
        .await
    }

    async fn preview(&self, task_id: &str, kind: PreviewKind) -> Result<PreviewResponse, BackendError> {
        match kind {
            PreviewKind::Source => {
                self.get_json(&["api", "preview-source", task_id], "Preview")
                    .await
            }
            PreviewKind::Chunk(id) => {
                let id = id.to_string();
                self.get_json(&["api", "preview-chunk", task_id, &id], "Preview")
                    .await
            }
            PreviewKind::Translation => {
                self.get_json(&["api", "preview", task_id], "Preview").await
            }
        }
    }

    async fn download(&self, task_id: &str) -> Result<DownloadedFile, BackendError> {
        let url = self.endpoint(&["api", "download", task_id])?;
        engine_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.settings.transfer_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response, "Download").await?;
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_filename);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            bytes.extend_from_slice(&chunk);
        }
        Ok(DownloadedFile {
            filename,
            bytes: Bytes::from(bytes),
        })
    }

    async fn terminology(&self) -> Result<TerminologyResponse, BackendError> {
        self.get_json(&["api", "terminology"], "Terminology").await
    }

    async fn status(&self, task_id: &str) -> Result<StatusResponse, BackendError> {
        self.get_json(&["api", "status", task_id], "Status").await
    }
}

/// Pass successful responses through; turn anything else into
/// `BackendError::Rejected` carrying the server's `error` text or a generic
/// `"<action> failed (HTTP n)"`.
async fn check_status(response: Response, action: &str) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) if !body.error.trim().is_empty() => body.error,
        _ => format!("{action} failed (HTTP {})", status.as_u16()),
    };
    Err(BackendError::Rejected {
        status: status.as_u16(),
        message,
    })
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| BackendError::Decode(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::Timeout;
    }
    BackendError::Network(err.to_string())
}

/// Extract the plain `filename=` parameter of a `Content-Disposition` value.
pub fn attachment_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|param| {
            let (key, value) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("filename")
                .then(|| value.trim().trim_matches('"').to_string())
        })
        .filter(|name| !name.is_empty())
}
