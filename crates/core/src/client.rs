//! Catbox client: uploads, Litterbox uploads and album management

use crate::config::ClientConfig;
use crate::duration::LitterboxDuration;
use crate::error::{Error, Result, UploadFailure};
use crate::form::UploadForm;
use crate::shortcode::{file_identifiers, validate_shortcode};
use crate::target::UploadTarget;
use crate::transport::{RawResponse, ReqwestTransport, Transport};
use reqwest::Url;
use std::sync::Arc;
use tracing::{debug, warn};

/// Error texts the service answers with a 200 status
const SERVICE_ERROR_PREFIXES: &[&str] = &[
    "error",
    "no files given",
    "no userhash",
    "invalid",
    "album not found",
    "not found",
    "you don't own",
    "file doesn't exist",
    "something went wrong",
];

/// What a successful response body looks like for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Url,
    Confirmation,
}

/// Client for the catbox.moe upload API.
///
/// Holds only immutable configuration and a shared transport, so a single
/// instance can be cloned or shared across tasks freely. Dropping a pending
/// call cancels its request.
#[derive(Clone)]
pub struct CatboxClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for CatboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatboxClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CatboxClient {
    /// Create a client sending requests with `reqwest`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client on top of a custom transport
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Settings the client was built with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether album and delete operations are available
    pub fn is_authenticated(&self) -> bool {
        self.config.userhash.is_some()
    }

    /// Upload a file and return its permanent URL.
    ///
    /// Attributed to the account when a userhash is configured, anonymous
    /// otherwise.
    pub async fn upload_file(&self, target: UploadTarget) -> Result<String> {
        let (file_name, body) = target.resolve().await?;

        let form = UploadForm::new("fileupload")
            .text_opt("userhash", self.config.userhash.as_deref())
            .file("fileToUpload", file_name.clone(), body);

        debug!(file = %file_name, "Uploading file");
        let link = self.post(&self.config.api_url, form, Expect::Url).await?;
        debug!(file = %file_name, link = %link, "File uploaded");

        Ok(link)
    }

    /// Upload a file to Litterbox. The link stops working once `duration`
    /// has elapsed; expiry is handled entirely by the service.
    pub async fn upload_to_litterbox(
        &self,
        target: UploadTarget,
        duration: LitterboxDuration,
    ) -> Result<String> {
        let (file_name, body) = target.resolve().await?;

        let form = UploadForm::new("fileupload")
            .text("time", duration.as_str())
            .file("fileToUpload", file_name.clone(), body);

        debug!(file = %file_name, duration = %duration, "Uploading file to Litterbox");
        let link = self.post(&self.config.litterbox_url, form, Expect::Url).await?;
        debug!(file = %file_name, link = %link, "Litterbox file uploaded");

        Ok(link)
    }

    /// Create an album from uploaded files and return the album URL.
    ///
    /// `files` are file names (`abc123.png`) or file URLs on the configured
    /// file host.
    pub async fn create_album<S: AsRef<str>>(
        &self,
        files: &[S],
        title: &str,
        description: &str,
    ) -> Result<String> {
        let userhash = self.require_userhash("create_album")?;
        let files = file_identifiers(files, &self.config.file_url)?;

        let form = UploadForm::new("createalbum")
            .text("userhash", userhash)
            .text("title", title)
            .text("desc", description)
            .text("files", files);

        let link = self.post(&self.config.api_url, form, Expect::Url).await?;
        debug!(link = %link, "Album created");

        Ok(link)
    }

    /// Replace the files, title and description of an album.
    ///
    /// Not incremental: files left out of `files` are removed from the album.
    pub async fn edit_album<S: AsRef<str>>(
        &self,
        shortcode: &str,
        files: &[S],
        title: &str,
        description: &str,
    ) -> Result<String> {
        let userhash = self.require_userhash("edit_album")?;
        let shortcode = validate_shortcode(shortcode)?;
        let files = file_identifiers(files, &self.config.file_url)?;

        let form = UploadForm::new("editalbum")
            .text("userhash", userhash)
            .text("short", shortcode)
            .text("title", title)
            .text("desc", description)
            .text("files", files);

        let confirmation = self.post(&self.config.api_url, form, Expect::Confirmation).await?;
        debug!(shortcode = %shortcode, "Album edited");

        Ok(confirmation)
    }

    /// Delete an album. The files it contained are kept.
    pub async fn delete_album(&self, shortcode: &str) -> Result<()> {
        let userhash = self.require_userhash("delete_album")?;
        let shortcode = validate_shortcode(shortcode)?;

        let form = UploadForm::new("deletealbum")
            .text("userhash", userhash)
            .text("short", shortcode);

        self.post(&self.config.api_url, form, Expect::Confirmation).await?;
        debug!(shortcode = %shortcode, "Album deleted");

        Ok(())
    }

    /// Permanently delete files owned by the account
    pub async fn delete_files<S: AsRef<str>>(&self, files: &[S]) -> Result<()> {
        let userhash = self.require_userhash("delete_files")?;
        if files.is_empty() {
            return Err(Error::InvalidArgument("No files to delete".to_string()));
        }
        let files = file_identifiers(files, &self.config.file_url)?;

        let form = UploadForm::new("deletefiles")
            .text("userhash", userhash)
            .text("files", files.clone());

        self.post(&self.config.api_url, form, Expect::Confirmation).await?;
        debug!(files = %files, "Files deleted");

        Ok(())
    }

    /// Shortcode of an album URL. Pure, no request is made.
    pub fn extract_shortcode(&self, album_url: &str) -> Result<String> {
        crate::shortcode::extract_shortcode(album_url)
    }

    fn require_userhash(&self, operation: &str) -> Result<&str> {
        self.config.userhash.as_deref().ok_or_else(|| {
            Error::Unauthenticated(format!("{} needs a userhash to identify the account", operation))
        })
    }

    async fn post(&self, url: &str, form: UploadForm, expect: Expect) -> Result<String> {
        let reqtype = form.text_value("reqtype").unwrap_or_default().to_string();
        debug!(reqtype = %reqtype, url = %url, "Sending request");

        let response = self.transport.send(url, form).await?;
        check_response(response, expect).inspect_err(|e| {
            warn!(reqtype = %reqtype, error = %e, "Request rejected");
        })
    }
}

/// Turn a raw response into the operation's result text
fn check_response(response: RawResponse, expect: Expect) -> Result<String> {
    let success = response.is_success();
    let RawResponse { status, body } = response;

    if !success {
        return Err(UploadFailure::Status { status, body }.into());
    }

    let text = body.trim();
    let accepted = match expect {
        Expect::Url => Url::parse(text)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false),
        Expect::Confirmation => !text.is_empty() && !is_service_error(text),
    };

    if accepted {
        Ok(text.to_string())
    } else {
        Err(UploadFailure::UnexpectedResponse { status, body }.into())
    }
}

fn is_service_error(text: &str) -> bool {
    let lower = text.to_lowercase();
    SERVICE_ERROR_PREFIXES.iter().any(|p| lower.starts_with(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FileBody;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio_test::{assert_err, assert_ok};

    const USERHASH: &str = "1234567890abcdef1234567890";

    /// Records every request and answers with a fixed response
    struct RecordingTransport {
        response: RawResponse,
        requests: Mutex<Vec<(String, UploadForm)>>,
    }

    impl RecordingTransport {
        fn new(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: RawResponse::new(status, body),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<(String, UploadForm)> {
            self.requests.lock().unwrap().clone()
        }

        fn only_request(&self) -> (String, UploadForm) {
            let requests = self.requests();
            assert_eq!(requests.len(), 1);
            requests.into_iter().next().unwrap()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, url: &str, form: UploadForm) -> Result<RawResponse> {
            self.requests.lock().unwrap().push((url.to_string(), form));
            Ok(self.response.clone())
        }
    }

    fn client(transport: &Arc<RecordingTransport>, userhash: Option<&str>) -> CatboxClient {
        let mut config = ClientConfig::new();
        if let Some(userhash) = userhash {
            config = config.with_userhash(userhash);
        }
        CatboxClient::with_transport(config, transport.clone())
    }

    fn bytes_target(name: &str, data: &[u8]) -> UploadTarget {
        UploadTarget::bytes(data.to_vec(), Some(name)).unwrap()
    }

    #[tokio::test]
    async fn test_upload_file_with_userhash() {
        let transport = RecordingTransport::new(200, "https://files.catbox.moe/abc123.png\n");
        let client = client(&transport, Some(USERHASH));

        let link = client.upload_file(bytes_target("cat.png", b"png")).await.unwrap();
        assert_eq!(link, "https://files.catbox.moe/abc123.png");

        let (url, form) = transport.only_request();
        assert_eq!(url, crate::config::DEFAULT_API_URL);
        assert_eq!(form.text_value("reqtype"), Some("fileupload"));
        assert_eq!(form.text_value("userhash"), Some(USERHASH));

        let part = form.file_part().unwrap();
        assert_eq!(part.file_name, "cat.png");
        assert_eq!(part.body, FileBody::Bytes(b"png".to_vec()));
    }

    #[tokio::test]
    async fn test_upload_file_anonymous() {
        let transport = RecordingTransport::new(200, "https://files.catbox.moe/abc123.png");
        let client = client(&transport, None);

        assert_ok!(client.upload_file(bytes_target("cat.png", b"png")).await);

        let (_, form) = transport.only_request();
        assert!(!form.has_field("userhash"));
    }

    #[tokio::test]
    async fn test_upload_file_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"jpeg-bytes").unwrap();

        let transport = RecordingTransport::new(200, "https://files.catbox.moe/x1y2z3.jpg");
        let client = client(&transport, None);

        assert_ok!(client.upload_file(UploadTarget::path(&path)).await);

        let (_, form) = transport.only_request();
        let part = form.file_part().unwrap();
        assert_eq!(part.file_name, "photo.jpg");
        assert_eq!(part.body, FileBody::File { path, len: 10 });
    }

    #[tokio::test]
    async fn test_upload_missing_file_makes_no_request() {
        let transport = RecordingTransport::new(200, "https://files.catbox.moe/x.png");
        let client = client(&transport, None);

        let result = client.upload_file(UploadTarget::path("/definitely/not/here.png")).await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_bytes_without_name_makes_no_request() {
        let transport = RecordingTransport::new(200, "https://files.catbox.moe/x.png");
        let client = client(&transport, Some(USERHASH));

        let target = UploadTarget::Bytes {
            data: b"data".to_vec(),
            file_name: String::new(),
        };
        let result = client.upload_file(target).await;

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_rejects_error_text_with_200() {
        let transport = RecordingTransport::new(200, "No files given.");
        let client = client(&transport, None);

        let err = client.upload_file(bytes_target("a.txt", b"a")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::UploadFailed(UploadFailure::UnexpectedResponse { status: 200, .. })
        ));
        assert_eq!(err.body(), Some("No files given."));
    }

    #[tokio::test]
    async fn test_litterbox_sends_each_duration_token() {
        let expected = [
            (LitterboxDuration::OneHour, "1h"),
            (LitterboxDuration::TwelveHours, "12h"),
            (LitterboxDuration::OneDay, "24h"),
            (LitterboxDuration::ThreeDays, "72h"),
            (LitterboxDuration::OneWeek, "1w"),
        ];

        for (duration, token) in expected {
            let transport = RecordingTransport::new(200, "https://litter.catbox.moe/abc.png");
            let client = client(&transport, None);

            assert_ok!(client.upload_to_litterbox(bytes_target("a.png", b"a"), duration).await);

            let (url, form) = transport.only_request();
            assert_eq!(url, crate::config::DEFAULT_LITTERBOX_URL);
            assert_eq!(form.text_value("time"), Some(token), "duration {:?}", duration);
        }
    }

    #[tokio::test]
    async fn test_litterbox_one_day_is_not_one_hour() {
        let transport = RecordingTransport::new(200, "https://litter.catbox.moe/abc.png");
        let client = client(&transport, None);

        assert_ok!(
            client
                .upload_to_litterbox(bytes_target("a.png", b"a"), LitterboxDuration::OneDay)
                .await
        );

        let (_, form) = transport.only_request();
        assert_eq!(form.text_value("time"), Some("24h"));
        assert_ne!(form.text_value("time"), Some("1h"));
    }

    #[tokio::test]
    async fn test_litterbox_never_sends_userhash() {
        let transport = RecordingTransport::new(200, "https://litter.catbox.moe/abc.png");
        let client = client(&transport, Some(USERHASH));

        assert_ok!(
            client
                .upload_to_litterbox(bytes_target("a.png", b"a"), LitterboxDuration::default())
                .await
        );

        let (_, form) = transport.only_request();
        assert_eq!(form.text_value("reqtype"), Some("fileupload"));
        assert!(!form.has_field("userhash"));
    }

    #[tokio::test]
    async fn test_create_album_fields() {
        let transport = RecordingTransport::new(200, "https://catbox.moe/c/pd412w");
        let client = client(&transport, Some(USERHASH));

        let files = ["https://files.catbox.moe/a.png", "b.jpg"];
        let link = client.create_album(&files, "Cats", "All the cats").await.unwrap();
        assert_eq!(link, "https://catbox.moe/c/pd412w");

        let (_, form) = transport.only_request();
        assert_eq!(form.text_value("reqtype"), Some("createalbum"));
        assert_eq!(form.text_value("userhash"), Some(USERHASH));
        assert_eq!(form.text_value("title"), Some("Cats"));
        assert_eq!(form.text_value("desc"), Some("All the cats"));
        assert_eq!(form.text_value("files"), Some("a.png b.jpg"));
    }

    #[tokio::test]
    async fn test_create_album_rejects_foreign_urls() {
        let transport = RecordingTransport::new(200, "https://catbox.moe/c/pd412w");
        let client = client(&transport, Some(USERHASH));

        let result = client
            .create_album(&["https://example.com/a.png"], "t", "d")
            .await;

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_result_feeds_create_album() {
        let upload = RecordingTransport::new(200, "https://files.catbox.moe/k9q2ab.png");
        let link = client(&upload, Some(USERHASH))
            .upload_file(bytes_target("k.png", b"k"))
            .await
            .unwrap();

        let album = RecordingTransport::new(200, "https://catbox.moe/c/xyz789");
        let album_link = client(&album, Some(USERHASH))
            .create_album(&[link], "t", "")
            .await
            .unwrap();

        assert!(!album_link.is_empty());
        let (_, form) = album.only_request();
        assert_eq!(form.text_value("files"), Some("k9q2ab.png"));
    }

    #[tokio::test]
    async fn test_edit_album_fields() {
        let transport = RecordingTransport::new(200, "https://catbox.moe/c/pd412w");
        let client = client(&transport, Some(USERHASH));

        let confirmation = client
            .edit_album("pd412w", &["a.png"], "New title", "")
            .await
            .unwrap();
        assert_eq!(confirmation, "https://catbox.moe/c/pd412w");

        let (_, form) = transport.only_request();
        assert_eq!(form.text_value("reqtype"), Some("editalbum"));
        assert_eq!(form.text_value("short"), Some("pd412w"));
        assert_eq!(form.text_value("files"), Some("a.png"));
        assert_eq!(form.text_value("title"), Some("New title"));
        assert_eq!(form.text_value("desc"), Some(""));
    }

    #[tokio::test]
    async fn test_edit_album_rejects_album_url_as_shortcode() {
        let transport = RecordingTransport::new(200, "ok");
        let client = client(&transport, Some(USERHASH));

        let result = client
            .edit_album("https://catbox.moe/c/pd412w", &["a.png"], "t", "d")
            .await;

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_edit_unknown_album_is_upload_failure() {
        let transport = RecordingTransport::new(200, "Album not found.");
        let client = client(&transport, Some(USERHASH));

        let result = client.edit_album("nope00", &["a.png"], "t", "d").await;
        assert!(matches!(result, Err(Error::UploadFailed(_))));
    }

    #[tokio::test]
    async fn test_delete_album_fields() {
        let transport = RecordingTransport::new(200, "Album deleted.");
        let client = client(&transport, Some(USERHASH));

        assert_ok!(client.delete_album("pd412w").await);

        let (_, form) = transport.only_request();
        assert_eq!(form.text_value("reqtype"), Some("deletealbum"));
        assert_eq!(form.text_value("short"), Some("pd412w"));
        assert_eq!(form.text_value("userhash"), Some(USERHASH));
    }

    #[tokio::test]
    async fn test_delete_files_fields() {
        let transport = RecordingTransport::new(200, "Files successfully deleted.");
        let client = client(&transport, Some(USERHASH));

        assert_ok!(
            client
                .delete_files(&["https://files.catbox.moe/a.png", "b.jpg"])
                .await
        );

        let (_, form) = transport.only_request();
        assert_eq!(form.text_value("reqtype"), Some("deletefiles"));
        assert_eq!(form.text_value("files"), Some("a.png b.jpg"));
    }

    #[tokio::test]
    async fn test_delete_files_empty_list() {
        let transport = RecordingTransport::new(200, "ok");
        let client = client(&transport, Some(USERHASH));

        let empty: [&str; 0] = [];
        assert!(matches!(
            client.delete_files(&empty).await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_account_operations_require_userhash() {
        let transport = RecordingTransport::new(200, "https://catbox.moe/c/pd412w");
        let client = client(&transport, None);
        assert!(!client.is_authenticated());

        assert!(matches!(
            client.create_album(&["a.png"], "t", "d").await,
            Err(Error::Unauthenticated(_))
        ));
        assert!(matches!(
            client.edit_album("pd412w", &["a.png"], "t", "d").await,
            Err(Error::Unauthenticated(_))
        ));
        assert!(matches!(
            client.delete_album("pd412w").await,
            Err(Error::Unauthenticated(_))
        ));
        assert!(matches!(
            client.delete_files(&["a.png"]).await,
            Err(Error::Unauthenticated(_))
        ));

        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_fails_every_operation() {
        let transport = RecordingTransport::new(500, "Internal Server Error");
        let client = client(&transport, Some(USERHASH));

        let results = vec![
            client.upload_file(bytes_target("a.png", b"a")).await.map(|_| ()),
            client
                .upload_to_litterbox(bytes_target("a.png", b"a"), LitterboxDuration::OneWeek)
                .await
                .map(|_| ()),
            client.create_album(&["a.png"], "t", "d").await.map(|_| ()),
            client.edit_album("pd412w", &["a.png"], "t", "d").await.map(|_| ()),
            client.delete_album("pd412w").await,
            client.delete_files(&["a.png"]).await,
        ];

        assert_eq!(transport.requests().len(), 6);
        for result in results {
            let err = assert_err!(result);
            assert!(matches!(
                err,
                Error::UploadFailed(UploadFailure::Status { status: 500, .. })
            ));
            assert_eq!(err.status(), Some(500));
            assert_eq!(err.body(), Some("Internal Server Error"));
        }
    }

    #[tokio::test]
    async fn test_concurrent_uploads_keep_their_own_payload() {
        let transport = RecordingTransport::new(200, "https://files.catbox.moe/abc.bin");
        let client = client(&transport, Some(USERHASH));

        let uploads = (0..16).map(|i| {
            let client = client.clone();
            tokio::spawn(async move {
                let data = format!("payload-{}", i).into_bytes();
                let name = format!("f{}.bin", i);
                client
                    .upload_file(UploadTarget::bytes(data, Some(name.as_str()))?)
                    .await
            })
        });

        for result in futures::future::join_all(uploads).await {
            assert_ok!(result.unwrap());
        }

        let requests = transport.requests();
        assert_eq!(requests.len(), 16);
        for (_, form) in requests {
            let part = form.file_part().unwrap();
            let index = part
                .file_name
                .trim_start_matches('f')
                .trim_end_matches(".bin")
                .to_string();
            assert_eq!(
                part.body,
                FileBody::Bytes(format!("payload-{}", index).into_bytes())
            );
        }
    }

    #[test]
    fn test_check_response_confirmation() {
        assert_eq!(
            check_response(RawResponse::new(200, " Album deleted. \n"), Expect::Confirmation).unwrap(),
            "Album deleted."
        );
        assert!(check_response(RawResponse::new(200, ""), Expect::Confirmation).is_err());
        assert!(check_response(RawResponse::new(200, "Invalid userhash."), Expect::Confirmation).is_err());
    }

    #[test]
    fn test_check_response_url() {
        assert!(check_response(RawResponse::new(200, "https://files.catbox.moe/a.png"), Expect::Url).is_ok());
        assert!(check_response(RawResponse::new(200, "ftp://files.catbox.moe/a.png"), Expect::Url).is_err());
        assert!(check_response(RawResponse::new(201, "https://files.catbox.moe/a.png"), Expect::Url).is_ok());
        assert!(check_response(RawResponse::new(404, "https://files.catbox.moe/a.png"), Expect::Url).is_err());
    }

    #[test]
    fn test_check_response_status_boundaries() {
        for status in [199, 300, 302, 500] {
            let result = check_response(RawResponse::new(status, "Album deleted."), Expect::Confirmation);
            assert!(
                matches!(result, Err(Error::UploadFailed(UploadFailure::Status { status: s, .. })) if s == status),
                "status {} accepted",
                status
            );
        }
        assert_ok!(check_response(RawResponse::new(299, "Album deleted."), Expect::Confirmation));
    }

    #[test]
    fn test_config_is_the_one_given() {
        let config = ClientConfig::new()
            .with_userhash(USERHASH)
            .with_album_url("https://mirror.example/c");
        let client = CatboxClient::with_transport(config, RecordingTransport::new(200, "x"));
        assert_eq!(client.config().album_url, "https://mirror.example/c");
        assert_eq!(client.config().userhash.as_deref(), Some(USERHASH));
    }
}
