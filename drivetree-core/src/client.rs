use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Parent id the service resolves to the account's top-level folder.
pub const ROOT_FOLDER_ID: &str = "root";

const FILE_FIELDS: &str = "id,name,webViewLink,webContentLink";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to encode metadata: {0}")]
    Json(#[from] serde_json::Error),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Auth,
    RateLimit,
    Transient,
    Permanent,
}

#[derive(Clone)]
pub struct DriveClient {
    http: Client,
    base_url: Url,
    token: String,
}

/// Content and metadata for a single file create call.
#[derive(Debug, Clone)]
pub struct FileUpload<'a> {
    pub name: &'a str,
    pub parent: Option<&'a str>,
    pub content: &'a [u8],
    pub content_type: &'a str,
    /// Native document type the service should convert the upload into.
    pub target_mime_type: Option<&'static str>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreatedFile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub web_view_link: Option<String>,
    #[serde(default)]
    pub web_content_link: Option<String>,
}

impl DriveClient {
    pub fn new(token: impl Into<String>) -> Result<Self, DriveError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: impl Into<String>) -> Result<Self, DriveError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            token: token.into(),
        })
    }

    pub async fn create_folder(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<String, DriveError> {
        let mut url = self.endpoint("/drive/v3/files")?;
        url.query_pairs_mut()
            .append_pair("fields", "id")
            .append_pair("supportsAllDrives", "true");
        let metadata = FileMetadata {
            name,
            mime_type: Some(FOLDER_MIME_TYPE),
            parents: parent.map(|p| vec![p]),
        };
        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header_value())
            .json(&metadata)
            .send()
            .await?;
        let created: CreatedId = Self::handle_response(response).await?;
        Ok(created.id)
    }

    pub async fn create_file(&self, upload: &FileUpload<'_>) -> Result<CreatedFile, DriveError> {
        let mut url = self.endpoint("/upload/drive/v3/files")?;
        url.query_pairs_mut()
            .append_pair("uploadType", "multipart")
            .append_pair("fields", FILE_FIELDS)
            .append_pair("supportsAllDrives", "true");
        let metadata = FileMetadata {
            name: upload.name,
            mime_type: upload.target_mime_type,
            parents: upload.parent.map(|p| vec![p]),
        };
        let boundary = multipart_boundary();
        let body = related_body(
            &boundary,
            &serde_json::to_vec(&metadata)?,
            upload.content_type,
            upload.content,
        );
        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header_value())
            .header(
                "Content-Type",
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub async fn create_permission(
        &self,
        file_id: &str,
        role: &str,
        scope: &str,
    ) -> Result<(), DriveError> {
        let mut url = self.endpoint(&format!("/drive/v3/files/{file_id}/permissions"))?;
        url.query_pairs_mut()
            .append_pair("supportsAllDrives", "true");
        let response = self
            .http
            .post(url)
            .header("Authorization", self.auth_header_value())
            .json(&PermissionRequest { role, scope })
            .send()
            .await?;
        let _: serde_json::Value = Self::handle_response(response).await?;
        Ok(())
    }

    fn auth_header_value(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DriveError> {
        Ok(self.base_url.join(path)?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DriveError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DriveError::Api { status, body })
        }
    }
}

impl DriveError {
    pub fn classification(&self) -> Option<ErrorClass> {
        match self {
            DriveError::Api { status, .. } => Some(classify_api_status(*status)),
            DriveError::Request(err) if is_transient_transport(err) => Some(ErrorClass::Transient),
            _ => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self.classification(),
            Some(ErrorClass::RateLimit | ErrorClass::Transient)
        )
    }
}

fn classify_api_status(status: StatusCode) -> ErrorClass {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        ErrorClass::Auth
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        ErrorClass::RateLimit
    } else if status.is_server_error() {
        ErrorClass::Transient
    } else {
        ErrorClass::Permanent
    }
}

// Timeouts, refused connections, DNS failures and resets while sending or
// while reading the response body.
fn is_transient_transport(err: &reqwest::Error) -> bool {
    err.is_timeout()
        || err.is_connect()
        || err.is_body()
        || (err.is_request() && err.status().is_none())
        || (err.is_decode() && !is_payload_error(err))
}

// A decode failure caused by the payload itself rather than the connection.
fn is_payload_error(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if cause.is::<serde_json::Error>() {
            return true;
        }
        source = cause.source();
    }
    false
}

fn multipart_boundary() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("drivetree-{suffix}")
}

fn related_body(boundary: &str, metadata: &[u8], content_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + content.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<Vec<&'a str>>,
}

#[derive(Debug, Serialize)]
struct PermissionRequest<'a> {
    role: &'a str,
    #[serde(rename = "type")]
    scope: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: String,
}
