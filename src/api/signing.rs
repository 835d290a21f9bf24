//! SigV4 signing for requests sent by [`HttpClient`](super::HttpClient).

use crate::error::{NeighborError, Result};
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningParams, SigningSettings};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use std::fmt;
use std::time::SystemTime;

/// Service name used in the credential scope
pub const SIGNING_NAME: &str = "s3vectors";

/// Signs requests with credentials from an AWS credential provider.
#[derive(Clone)]
pub struct RequestSigner {
    credentials: SharedCredentialsProvider,
    region: String,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    pub fn new(credentials: impl ProvideCredentials + 'static, region: impl Into<String>) -> Self {
        Self {
            credentials: SharedCredentialsProvider::new(credentials),
            region: region.into(),
        }
    }

    /// Signer backed by the default AWS credential chain (environment,
    /// profile files, SSO, container and instance metadata).
    ///
    /// `region` overrides the region found by the chain.
    pub async fn from_env(region: Option<&str>) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let sdk_config = loader.load().await;

        let region = sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .ok_or_else(|| NeighborError::Config("no AWS region configured for signing".to_string()))?;
        let credentials = sdk_config
            .credentials_provider()
            .ok_or_else(|| NeighborError::Config("no AWS credentials provider found".to_string()))?;

        Ok(Self { credentials, region })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Headers to add to a request so that it carries a valid signature.
    pub async fn sign(
        &self,
        method: &str,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<Vec<(String, String)>> {
        let credentials = self
            .credentials
            .provide_credentials()
            .await
            .map_err(|e| NeighborError::Signing(format!("failed to load credentials: {}", e)))?;
        signature_headers(&credentials, &self.region, SystemTime::now(), method, url, headers, body)
    }
}

pub(crate) fn signature_headers(
    credentials: &Credentials,
    region: &str,
    time: SystemTime,
    method: &str,
    url: &str,
    headers: &[(&str, &str)],
    body: &[u8],
) -> Result<Vec<(String, String)>> {
    let identity: Identity = credentials.clone().into();
    let params: SigningParams<'_> = v4::SigningParams::builder()
        .identity(&identity)
        .region(region)
        .name(SIGNING_NAME)
        .time(time)
        .settings(SigningSettings::default())
        .build()
        .map_err(|e| NeighborError::Signing(e.to_string()))?
        .into();

    let request = SignableRequest::new(method, url, headers.iter().copied(), SignableBody::Bytes(body))
        .map_err(|e| NeighborError::Signing(e.to_string()))?;
    let (instructions, _signature) = sign(request, &params)
        .map_err(|e| NeighborError::Signing(e.to_string()))?
        .into_parts();

    Ok(instructions
        .headers()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_signature_headers() {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
        // 2025-01-01T00:00:00Z
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_735_689_600);

        let headers = signature_headers(
            &credentials,
            "us-east-1",
            time,
            "POST",
            "https://s3vectors.us-east-1.api.aws/GetIndex",
            &[("content-type", "application/json")],
            br#"{"vectorBucketName":"b","indexName":"items"}"#,
        )
        .unwrap();

        let authorization = header(&headers, "authorization").unwrap();
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20250101/us-east-1/s3vectors/aws4_request"
        ));
        assert!(authorization.contains("SignedHeaders="));
        assert!(authorization.contains("Signature="));
        assert_eq!(header(&headers, "x-amz-date"), Some("20250101T000000Z"));
        assert!(header(&headers, "x-amz-security-token").is_none());
    }

    #[test]
    fn test_session_token_is_sent() {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret", Some("token".to_string()), None, "test");
        let headers = signature_headers(
            &credentials,
            "eu-west-1",
            SystemTime::now(),
            "POST",
            "https://s3vectors.eu-west-1.api.aws/QueryVectors",
            &[],
            b"{}",
        )
        .unwrap();
        assert_eq!(header(&headers, "x-amz-security-token"), Some("token"));
    }

    #[test]
    fn test_signature_depends_on_body() {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret", None, None, "test");
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_735_689_600);
        let url = "https://s3vectors.us-east-1.api.aws/PutVectors";

        let a = signature_headers(&credentials, "us-east-1", time, "POST", url, &[], b"{\"a\":1}").unwrap();
        let b = signature_headers(&credentials, "us-east-1", time, "POST", url, &[], b"{\"a\":2}").unwrap();
        assert_ne!(header(&a, "authorization"), header(&b, "authorization"));
    }

    #[tokio::test]
    async fn test_signer_uses_provider() {
        let signer = RequestSigner::new(
            Credentials::new("AKIDEXAMPLE", "secret", None, None, "test"),
            "us-east-1",
        );
        assert_eq!(signer.region(), "us-east-1");

        let headers = signer
            .sign("POST", "https://s3vectors.us-east-1.api.aws/GetIndex", &[], b"{}")
            .await
            .unwrap();
        assert!(header(&headers, "authorization").is_some());
    }
}
