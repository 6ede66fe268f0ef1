//! Relay HTTP client.
//!
//! One POST per upload. The body is a plain string with no custom headers
//! and no content type; the relay parses the JSON itself.

use driveup_protocol::{PayloadMode, ResponsePayload, UploadOutcome, UploadQuery};
use driveup_transfer::{SelectedFile, build_renamed_filename, encode_payload, validate_file};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::error::{GENERIC_REJECTION, RelayError};
use crate::signal::{RequestSignal, SignalReason};

/// A single upload to perform.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: SelectedFile,
    /// Requested base name; the original extension is appended.
    pub new_name: String,
    /// Caller-side abort. Combined with the configured timeout.
    pub cancel: Option<CancellationToken>,
    /// Overrides the configured payload mode.
    pub payload_mode: Option<PayloadMode>,
}

impl UploadRequest {
    pub fn new(file: SelectedFile, new_name: impl Into<String>) -> Self {
        Self {
            file,
            new_name: new_name.into(),
            cancel: None,
            payload_mode: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_payload_mode(mut self, mode: PayloadMode) -> Self {
        self.payload_mode = Some(mode);
        self
    }
}

/// Relay upload client.
pub struct RelayClient {
    http: reqwest::Client,
    config: RelayConfig,
}

impl RelayClient {
    /// Creates a client. The request deadline is applied per upload, not
    /// on the underlying HTTP client.
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Validates, renames, encodes and sends one file.
    ///
    /// The file is read and encoded completely before the request starts.
    /// The timeout clock starts when the request is sent.
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadOutcome, RelayError> {
        let endpoint = self
            .config
            .endpoint_url
            .as_deref()
            .ok_or(RelayError::ConfigurationMissing)?;

        let UploadRequest {
            file,
            new_name,
            cancel,
            payload_mode,
        } = request;

        let validation = validate_file(Some(&file));
        if !validation.is_valid() {
            return Err(RelayError::ValidationFailed(validation.into_errors()));
        }

        let renamed = build_renamed_filename(&new_name, file.name());
        if renamed.is_empty() {
            return Err(RelayError::RenameInvalid(format!(
                "\"{new_name}\" contains no usable characters"
            )));
        }

        let mode = payload_mode.unwrap_or(self.config.payload_mode);
        let api_key = self.config.api_key.as_deref();
        let url = build_request_url(
            endpoint,
            &UploadQuery::new(&renamed, file.mime_type(), mode, api_key),
        )?;

        let read_cancel = cancel.clone().unwrap_or_default();
        let body = encode_payload(&file, &renamed, mode, api_key, &read_cancel)
            .await?
            .to_json()?;
        debug!(filename = %renamed, body_bytes = body.len(), "request body encoded");

        info!(
            filename = %renamed,
            mode = %mode,
            size = file.size_bytes(),
            "uploading to relay"
        );

        let signal = RequestSignal::compose(cancel, Some(self.config.timeout));
        let send = async {
            let response = self.http.post(url).body(body).send().await?;
            let status = response.status();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        let (status, text) = tokio::select! {
            biased;
            reason = signal.fired() => {
                return Err(match reason {
                    SignalReason::External => {
                        info!(filename = %renamed, "upload cancelled by caller");
                        RelayError::Cancelled
                    }
                    SignalReason::Timeout => {
                        warn!(
                            filename = %renamed,
                            timeout_ms = self.config.timeout.as_millis() as u64,
                            "upload timed out"
                        );
                        RelayError::Timeout(self.config.timeout)
                    }
                });
            }
            result = send => result?,
        };

        let payload = ResponsePayload::parse(&text);

        if !status.is_success() {
            let message = payload
                .error()
                .or_else(|| payload.message())
                .unwrap_or_else(|| GENERIC_REJECTION.to_string());
            warn!(status = status.as_u16(), %message, "relay rejected upload");
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        // A 2xx answer can still carry a logical failure.
        if let Some(message) = payload.error() {
            warn!(status = status.as_u16(), %message, "relay reported an error");
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let outcome = UploadOutcome::from_response(payload, &renamed);
        info!(
            filename = %outcome.file_name,
            file_id = %outcome.file_id,
            "upload accepted"
        );
        Ok(outcome)
    }
}

/// Appends the upload query to the endpoint URL.
pub fn build_request_url(
    endpoint: &str,
    query: &UploadQuery<'_>,
) -> Result<reqwest::Url, RelayError> {
    reqwest::Url::parse_with_params(endpoint, query.pairs())
        .map_err(|e| RelayError::InvalidEndpoint(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;
    use crate::error::ErrorKind;

    /// Raw request as seen by the mock relay.
    struct Captured {
        head: String,
        body: String,
    }

    impl Captured {
        fn query(&self) -> HashMap<String, String> {
            let target = self
                .head
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/");
            let url = reqwest::Url::parse(&format!("http://mock{target}")).unwrap();
            url.query_pairs().into_owned().collect()
        }

        fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap()
        }

        fn has_header(&self, name: &str) -> bool {
            let prefix = format!("{}:", name.to_lowercase());
            self.head
                .lines()
                .any(|line| line.to_lowercase().starts_with(&prefix))
        }
    }

    /// Reads one full HTTP/1.1 request, honouring Content-Length.
    async fn read_request(stream: &mut TcpStream) -> Captured {
        let mut buf = Vec::new();
        let mut chunk = vec![0u8; 64 * 1024];
        let mut header_end = None;
        let mut content_length = 0usize;

        loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            if header_end.is_none()
                && let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n")
            {
                header_end = Some(pos);
                let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                content_length = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(0);
            }
            if let Some(end) = header_end
                && buf.len() >= end + 4 + content_length
            {
                break;
            }
        }

        let end = header_end.unwrap_or(buf.len());
        let body_start = (end + 4).min(buf.len());
        Captured {
            head: String::from_utf8_lossy(&buf[..end]).into_owned(),
            body: String::from_utf8_lossy(&buf[body_start..]).into_owned(),
        }
    }

    /// Starts a mock relay that answers one request with `status` and `body`.
    async fn mock_relay(status: u16, body: &str) -> (String, tokio::task::JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}/exec");
        let body = body.to_string();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let captured = read_request(&mut stream).await;
            let resp = format!(
                "HTTP/1.1 {status} Mock\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(resp.as_bytes()).await;
            let _ = stream.shutdown().await;
            captured
        });

        (url, handle)
    }

    /// Starts a mock relay that reads the request and never answers.
    async fn silent_relay() -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let url = format!("http://127.0.0.1:{port}/exec");

        let handle = tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let _ = read_request(&mut stream).await;
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        });

        (url, handle)
    }

    fn pdf(bytes: Vec<u8>) -> SelectedFile {
        SelectedFile::from_bytes("old report.pdf", "application/pdf", bytes)
    }

    #[tokio::test]
    async fn base64_upload_sends_envelope_and_key_in_body() {
        let (url, handle) =
            mock_relay(200, r#"{"fileId":"abc123","fileUrl":"https://x/abc123"}"#).await;
        let client = RelayClient::new(RelayConfig::new(url).with_api_key("s3cret")).unwrap();

        let data = vec![0u8, 1, 2, 250, 255];
        let outcome = client
            .upload(UploadRequest::new(pdf(data.clone()), "My Report"))
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.file_name, "My Report.pdf");
        assert_eq!(outcome.file_id, "abc123");
        assert_eq!(outcome.file_url, "https://x/abc123");

        let captured = handle.await.unwrap();
        assert!(captured.head.starts_with("POST "));
        let query = captured.query();
        assert_eq!(query["filename"], "My Report.pdf");
        assert_eq!(query["mimeType"], "application/pdf");
        assert_eq!(query["mode"], "base64");
        assert!(!query.contains_key("apiKey"));

        let body = captured.json();
        assert_eq!(body["filename"], "My Report.pdf");
        assert_eq!(body["encoding"], "base64");
        assert_eq!(body["apiKey"], "s3cret");
        assert_eq!(body["data"], STANDARD.encode(&data));
        assert!(!captured.has_header("content-type"));
    }

    #[tokio::test]
    async fn byte_array_upload_sends_bare_array_and_key_in_query() {
        let (url, handle) = mock_relay(200, r#"{"id":"b1","url":"https://x/b1"}"#).await;
        let config = RelayConfig::new(url)
            .with_api_key("s3cret")
            .with_payload_mode(PayloadMode::ByteArray);
        let client = RelayClient::new(config).unwrap();

        let outcome = client
            .upload(UploadRequest::new(pdf(vec![0, 127, 128, 255]), "scan"))
            .await
            .unwrap();
        assert_eq!(outcome.file_id, "b1");
        assert_eq!(outcome.file_url, "https://x/b1");

        let captured = handle.await.unwrap();
        let query = captured.query();
        assert_eq!(query["mode"], "byteArray");
        assert_eq!(query["apiKey"], "s3cret");
        assert_eq!(captured.json(), serde_json::json!([0, 127, -128, -1]));
    }

    #[tokio::test]
    async fn request_mode_overrides_config() {
        let (url, handle) = mock_relay(200, "{}").await;
        let client = RelayClient::new(RelayConfig::new(url)).unwrap();

        client
            .upload(
                UploadRequest::new(pdf(vec![1]), "x").with_payload_mode(PayloadMode::ByteArray),
            )
            .await
            .unwrap();

        let captured = handle.await.unwrap();
        assert_eq!(captured.query()["mode"], "byteArray");
        assert!(!captured.query().contains_key("apiKey"));
    }

    #[tokio::test]
    async fn non_success_status_uses_error_field() {
        let (url, handle) = mock_relay(500, r#"{"error":"Drive quota exceeded"}"#).await;
        let client = RelayClient::new(RelayConfig::new(url)).unwrap();

        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "x"))
            .await
            .unwrap_err();
        match &err {
            RelayError::Rejected { status, message } => {
                assert_eq!(*status, 500);
                assert_eq!(message, "Drive quota exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::RemoteRejected);
        handle.abort();
    }

    #[tokio::test]
    async fn non_success_status_uses_message_field() {
        let (url, handle) = mock_relay(403, r#"{"message":"Forbidden key"}"#).await;
        let client = RelayClient::new(RelayConfig::new(url)).unwrap();

        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Forbidden key");
        handle.abort();
    }

    #[tokio::test]
    async fn non_success_plain_text_gets_generic_message() {
        let (url, handle) = mock_relay(502, "Bad Gateway").await;
        let client = RelayClient::new(RelayConfig::new(url)).unwrap();

        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), GENERIC_REJECTION);
        handle.abort();
    }

    #[tokio::test]
    async fn success_status_with_error_field_is_rejected() {
        let (url, handle) = mock_relay(200, r#"{"error":"Invalid API key"}"#).await;
        let client = RelayClient::new(RelayConfig::new(url)).unwrap();

        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Rejected { status: 200, .. }));
        assert_eq!(err.to_string(), "Invalid API key");
        handle.abort();
    }

    #[tokio::test]
    async fn success_with_plain_text_keeps_raw() {
        let (url, handle) = mock_relay(200, "stored").await;
        let client = RelayClient::new(RelayConfig::new(url)).unwrap();

        let outcome = client
            .upload(UploadRequest::new(pdf(vec![1]), "plain"))
            .await
            .unwrap();
        assert_eq!(outcome.file_name, "plain.pdf");
        assert_eq!(outcome.file_id, "");
        assert_eq!(outcome.raw, serde_json::json!({"raw": "stored"}));
        handle.abort();
    }

    #[tokio::test]
    async fn missing_endpoint_is_configuration_error() {
        let client = RelayClient::new(RelayConfig::default()).unwrap();
        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigurationMissing);
    }

    #[tokio::test]
    async fn invalid_endpoint_is_reported() {
        let client = RelayClient::new(RelayConfig::new("not a url")).unwrap();
        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidEndpoint(_)));
    }

    #[tokio::test]
    async fn unsupported_file_is_rejected_before_network() {
        let client = RelayClient::new(RelayConfig::new("http://127.0.0.1:9/exec")).unwrap();
        let file = SelectedFile::from_bytes("tool.exe", "application/x-msdownload", vec![1]);
        let err = client
            .upload(UploadRequest::new(file, "x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(err.to_string(), driveup_transfer::UNSUPPORTED_FORMAT);
    }

    #[tokio::test]
    async fn blank_rename_is_rejected_before_network() {
        let client = RelayClient::new(RelayConfig::new("http://127.0.0.1:9/exec")).unwrap();
        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "   "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RenameInvalid);
    }

    #[tokio::test]
    async fn external_cancel_before_response() {
        let (url, handle) = silent_relay().await;
        let client = RelayClient::new(RelayConfig::new(url)).unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let err = client
            .upload(UploadRequest::new(pdf(vec![1, 2, 3]), "x").with_cancel(cancel))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        handle.abort();
    }

    #[tokio::test]
    async fn already_cancelled_token_skips_request() {
        let client = RelayClient::new(RelayConfig::new("http://127.0.0.1:9/exec")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "x").with_cancel(cancel))
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn timeout_is_transport_failure() {
        let (url, handle) = silent_relay().await;
        let config = RelayConfig::new(url).with_timeout(Duration::from_millis(200));
        let client = RelayClient::new(config).unwrap();

        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "x").with_cancel(CancellationToken::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Timeout(_)));
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
        assert!(!err.is_cancelled());
        handle.abort();
    }

    #[tokio::test]
    async fn connection_refused_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client =
            RelayClient::new(RelayConfig::new(format!("http://127.0.0.1:{port}/exec"))).unwrap();
        let err = client
            .upload(UploadRequest::new(pdf(vec![1]), "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }

    #[tokio::test]
    async fn unreadable_file_is_transport_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        let file = SelectedFile::from_path(&path, None).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let client = RelayClient::new(RelayConfig::new("http://127.0.0.1:9/exec")).unwrap();
        let err = client
            .upload(UploadRequest::new(file, "renamed"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Read(_)));
        assert_eq!(err.kind(), ErrorKind::TransportFailure);
    }

    #[test]
    fn request_url_encodes_query() {
        let query = UploadQuery::new("a b&c.pdf", "application/pdf", PayloadMode::Base64, None);
        let url = build_request_url("https://relay.example/exec", &query).unwrap();
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["filename"], "a b&c.pdf");
        assert_eq!(pairs["mode"], "base64");
        assert_eq!(url.path(), "/exec");
    }

    #[test]
    fn request_url_keeps_existing_query() {
        let query = UploadQuery::new("a.pdf", "application/pdf", PayloadMode::ByteArray, Some("k"));
        let url = build_request_url("https://relay.example/exec?v=2", &query).unwrap();
        let pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["v"], "2");
        assert_eq!(pairs["apiKey"], "k");
    }
}
