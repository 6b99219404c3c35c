//! HTTP transport for multipart POST requests

use crate::error::Result;
use crate::form::{FileBody, FormField, UploadForm};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use std::time::Duration;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Status and text of a response, before any interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one multipart/form-data POST and returns the raw response.
///
/// Implementations only report transport failures as errors; HTTP error
/// statuses come back as a `RawResponse` for the client to judge.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &str, form: UploadForm) -> Result<RawResponse>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: Client,
}

impl ReqwestTransport {
    /// Create a transport whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("catbox-core/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http_client })
    }

    async fn build_form(form: UploadForm) -> Result<Form> {
        let mut multipart = Form::new();

        for field in form.into_fields() {
            multipart = match field {
                FormField::Text { name, value } => multipart.text(name, value),
                FormField::File { name, part } => {
                    let body = match part.body {
                        FileBody::Bytes(data) => Part::bytes(data),
                        FileBody::File { path, len } => {
                            let file = File::open(&path).await?;
                            let stream = ReaderStream::new(file);
                            Part::stream_with_length(Body::wrap_stream(stream), len)
                        }
                    };
                    let body = body.file_name(part.file_name).mime_str(part.content_type)?;
                    multipart.part(name, body)
                }
            };
        }

        Ok(multipart)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, url: &str, form: UploadForm) -> Result<RawResponse> {
        let multipart = Self::build_form(form).await?;

        let response = self.http_client.post(url).multipart(multipart).send().await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CatboxClient;
    use crate::config::ClientConfig;
    use crate::error::{Error, UploadFailure};
    use crate::target::UploadTarget;
    use httpmock::prelude::*;

    fn transport() -> ReqwestTransport {
        ReqwestTransport::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_sends_fields_and_returns_body() {
        let server = MockServer::start_async().await;

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/user/api.php")
                    .body_contains("name=\"reqtype\"")
                    .body_contains("fileupload")
                    .body_contains("filename=\"cat.txt\"")
                    .body_contains("meow");
                then.status(200).body("https://files.catbox.moe/abc123.txt");
            })
            .await;

        let form = UploadForm::new("fileupload").file(
            "fileToUpload",
            "cat.txt".to_string(),
            FileBody::Bytes(b"meow".to_vec()),
        );

        let response = transport()
            .send(&server.url("/user/api.php"), form)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response, RawResponse::new(200, "https://files.catbox.moe/abc123.txt"));
    }

    #[tokio::test]
    async fn test_streams_file_from_disk() {
        let server = MockServer::start_async().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streamed.bin");
        std::fs::write(&path, b"streamed-content").unwrap();

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).body_contains("streamed-content");
                then.status(200).body("ok");
            })
            .await;

        let form = UploadForm::new("fileupload").file(
            "fileToUpload",
            "streamed.bin".to_string(),
            FileBody::File { path, len: 16 },
        );

        let response = transport().send(&server.url("/"), form).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn test_server_error_is_returned_not_raised() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(500).body("Internal Server Error");
            })
            .await;

        let response = transport()
            .send(&server.url("/"), UploadForm::new("deletealbum"))
            .await
            .unwrap();

        assert_eq!(response.status, 500);
        assert_eq!(response.body, "Internal Server Error");
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = transport()
            .send(&format!("http://127.0.0.1:{}/", port), UploadForm::new("fileupload"))
            .await;

        assert!(matches!(
            result,
            Err(Error::UploadFailed(UploadFailure::Transport { .. }))
        ));
    }

    #[tokio::test]
    async fn test_slow_server_is_timeout_failure() {
        let server = MockServer::start_async().await;

        server
            .mock_async(|when, then| {
                when.method(POST).path("/user/api.php");
                then.status(200)
                    .body("https://files.catbox.moe/late.txt")
                    .delay(Duration::from_secs(3));
            })
            .await;

        let config = ClientConfig::new()
            .with_api_url(server.url("/user/api.php"))
            .with_timeout(Duration::from_millis(300));
        let client = CatboxClient::new(config).unwrap();

        let result = client
            .upload_file(UploadTarget::bytes(b"meow".to_vec(), Some("late.txt")).unwrap())
            .await;

        assert!(
            matches!(result, Err(Error::UploadFailed(UploadFailure::Timeout { .. }))),
            "got {:?}",
            result
        );
    }
}
