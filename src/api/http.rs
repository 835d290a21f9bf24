//! JSON-over-HTTP implementation of [`VectorsApi`].

use crate::api::signing::RequestSigner;
use crate::api::types::*;
use crate::api::VectorsApi;
use crate::config::ClientConfig;
use crate::error::{NeighborError, Result, ServiceError, ServiceErrorKind};
use crate::metrics::MetricsCollector;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// HTTP client for the S3 Vectors API.
///
/// Each operation is a `POST {endpoint}/{Operation}` with a JSON body.
/// With a [`RequestSigner`] every request carries a SigV4 signature;
/// without one, requests go out with only the configured headers, for
/// endpoints that authenticate another way or sit behind a signing proxy.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    signer: Option<RequestSigner>,
    metrics: Mutex<MetricsCollector>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "Message")]
    message: Option<String>,
    #[serde(default, rename = "__type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl HttpClient {
    /// Build an unsigned client.
    ///
    /// Fails when `config.sign_requests` is set, since loading credentials
    /// is async; use [`HttpClient::connect`] or [`HttpClient::with_signer`].
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if config.sign_requests {
            return Err(NeighborError::Config(
                "sign_requests needs credentials; build the client with HttpClient::connect".to_string(),
            ));
        }
        Self::build(config)
    }

    /// Build a client, loading AWS credentials when `config.sign_requests`
    /// is set.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let client = Self::build(config)?;
        if !config.sign_requests {
            return Ok(client);
        }
        let signer = RequestSigner::from_env(config.region.as_deref()).await?;
        debug!(region = signer.region(), "signing requests");
        Ok(client.with_signer(signer))
    }

    /// Sign every request with `signer`.
    pub fn with_signer(mut self, signer: RequestSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    fn build(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.resolve_endpoint()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| NeighborError::Config(format!("invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| NeighborError::Config(format!("invalid value for header {}", name)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            signer: None,
            metrics: Mutex::new(MetricsCollector::new()),
        })
    }

    /// Build a client from `S3VECTORS_*` / `AWS_*` environment variables.
    pub async fn from_env() -> Result<Self> {
        Self::connect(&ClientConfig::from_env()?).await
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_signed(&self) -> bool {
        self.signer.is_some()
    }

    /// Snapshot of the request metrics collected so far.
    pub fn metrics(&self) -> MetricsCollector {
        self.metrics
            .lock()
            .map(|m| m.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    async fn call<B, R>(&self, operation: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let text = self.send(operation, body).await?;
        let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
        Ok(serde_json::from_str(text)?)
    }

    async fn send<B>(&self, operation: &str, body: &B) -> Result<String>
    where
        B: Serialize + ?Sized + Sync,
    {
        let start = Instant::now();
        let result = self.execute(operation, body).await;
        let elapsed = start.elapsed();

        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_request(operation, elapsed, result.is_ok());
        }

        match &result {
            Ok(_) => debug!(operation, elapsed_ms = elapsed.as_millis() as u64, "request completed"),
            Err(NeighborError::Service(e)) => {
                debug!(operation, status = e.status, kind = ?e.kind, message = %e.message, "service error")
            }
            Err(e) => warn!(operation, error = %e, "request failed"),
        }
        result
    }

    async fn execute<B>(&self, operation: &str, body: &B) -> Result<String>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = format!("{}/{}", self.endpoint, operation);
        let payload = serde_json::to_vec(body)?;

        let mut request = self.client.post(&url);
        if let Some(signer) = &self.signer {
            let signature = signer
                .sign("POST", &url, &[("content-type", "application/json")], &payload)
                .await?;
            for (name, value) in signature {
                request = request.header(name, value);
            }
        }
        let response = request.body(payload).send().await?;

        let status = response.status();
        let error_type = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;

        if !status.is_success() {
            return Err(parse_service_error(status.as_u16(), error_type.as_deref(), &text).into());
        }
        Ok(text)
    }
}

/// Translate an error response into a [`ServiceError`].
///
/// The error type comes from the `x-amzn-ErrorType` header, then the
/// body's `__type` or `code`, then the status code.
pub(crate) fn parse_service_error(status: u16, error_type: Option<&str>, body: &str) -> ServiceError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let kind = error_type
        .map(str::to_string)
        .or(parsed.error_type)
        .or(parsed.code)
        .map(|t| ServiceErrorKind::from_type_name(&t))
        .unwrap_or_else(|| ServiceErrorKind::from_status(status));

    let message = match parsed.message {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => format!("HTTP {}", status),
    };

    ServiceError::new(kind, status, message)
}

#[async_trait]
impl VectorsApi for HttpClient {
    async fn create_index(&self, request: &CreateIndexRequest) -> Result<()> {
        self.send("CreateIndex", request).await.map(|_| ())
    }

    async fn get_index(&self, request: &IndexRef) -> Result<GetIndexResponse> {
        self.call("GetIndex", request).await
    }

    async fn delete_index(&self, request: &IndexRef) -> Result<()> {
        self.send("DeleteIndex", request).await.map(|_| ())
    }

    async fn put_vectors(&self, request: &PutVectorsRequest) -> Result<()> {
        self.send("PutVectors", request).await.map(|_| ())
    }

    async fn get_vectors(&self, request: &GetVectorsRequest) -> Result<GetVectorsResponse> {
        self.call("GetVectors", request).await
    }

    async fn delete_vectors(&self, request: &DeleteVectorsRequest) -> Result<()> {
        self.send("DeleteVectors", request).await.map(|_| ())
    }

    async fn list_vectors(&self, request: &ListVectorsRequest) -> Result<ListVectorsResponse> {
        self.call("ListVectors", request).await
    }

    async fn query_vectors(&self, request: &QueryVectorsRequest) -> Result<QueryVectorsResponse> {
        self.call("QueryVectors", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_header() {
        let err = parse_service_error(
            404,
            Some("NotFoundException:http://internal.amazon.com/coral/com.amazonaws.s3vectors/"),
            r#"{"message":"The specified index could not be found"}"#,
        );
        assert_eq!(err.kind, ServiceErrorKind::NotFound);
        assert_eq!(err.message, "The specified index could not be found");
        assert_eq!(err.status, 404);
    }

    #[test]
    fn test_error_from_body_type() {
        let err = parse_service_error(
            400,
            None,
            r#"{"__type":"com.amazonaws.s3vectors#ValidationException","Message":"Invalid use of non-filterable metadata in filter"}"#,
        );
        assert_eq!(err.kind, ServiceErrorKind::Validation);
        assert_eq!(err.message, "Invalid use of non-filterable metadata in filter");
    }

    #[test]
    fn test_error_from_status_only() {
        let err = parse_service_error(409, None, "");
        assert_eq!(err.kind, ServiceErrorKind::Conflict);
        assert_eq!(err.message, "HTTP 409");

        let err = parse_service_error(502, None, "Bad Gateway");
        assert_eq!(err.kind, ServiceErrorKind::Internal);
        assert_eq!(err.message, "Bad Gateway");
    }

    #[test]
    fn test_endpoint_from_config() {
        let client = HttpClient::new(
            &ClientConfig::default()
                .with_region("us-east-1")
                .with_header("x-api-key", "secret"),
        )
        .unwrap();
        assert_eq!(client.endpoint(), "https://s3vectors.us-east-1.api.aws");
        assert_eq!(client.metrics().total_requests(), 0);
    }

    #[test]
    fn test_signing_needs_connect() {
        let result = HttpClient::new(
            &ClientConfig::default()
                .with_region("us-east-1")
                .with_signing(true),
        );
        assert!(matches!(result, Err(NeighborError::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_unsigned() {
        let client = HttpClient::connect(&ClientConfig::default().with_endpoint("http://localhost:1"))
            .await
            .unwrap();
        assert!(!client.is_signed());
    }

    #[test]
    fn test_with_signer() {
        let signer = RequestSigner::new(
            aws_credential_types::Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"),
            "us-east-1",
        );
        let client = HttpClient::new(&ClientConfig::default().with_region("us-east-1"))
            .unwrap()
            .with_signer(signer);
        assert!(client.is_signed());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = HttpClient::new(
            &ClientConfig::default()
                .with_endpoint("http://localhost:1")
                .with_header("bad header", "x"),
        );
        assert!(matches!(result, Err(NeighborError::Config(_))));
    }
}
