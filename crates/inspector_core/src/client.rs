use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::errors::InspectorError;
use crate::models::{DatasetRecord, FailureBody, FileRecord, TokenPayload, TokenRequest};

pub const TOKENS_ENDPOINT: &str = "api/tokens";
pub const DATASETS_ENDPOINT: &str = "api/datasets";
pub const AUTH_HEADER: &str = "x-auth-token";

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub timeout: Duration,
    /// Appliances usually ship with self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::from_secs(30),
            accept_invalid_certs: true,
        }
    }
}

/// Session against one vision service. Holds the auth token once
/// [`VisionClient::authenticate`] succeeds.
#[derive(Clone)]
pub struct VisionClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl VisionClient {
    pub fn new(options: ClientOptions) -> Result<Self, InspectorError> {
        let base_url = normalize_base_url(&options.base_url)?;

        let client = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()
            .map_err(InspectorError::Request)?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Base URL without a trailing slash, as used in deep links.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub async fn authenticate(&mut self, username: &str, password: &str) -> Result<(), InspectorError> {
        let url = self.endpoint(TOKENS_ENDPOINT);
        debug!(%url, "requesting auth token");
        let body = TokenRequest {
            grant_type: "password",
            username,
            password,
        };
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(InspectorError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(InspectorError::Auth(format!("token request returned {status}")));
        }
        let bytes = response.bytes().await.map_err(InspectorError::Request)?;
        check_failure(status.as_u16(), &bytes)?;
        let payload: TokenPayload = serde_json::from_slice(&bytes)
            .map_err(|err| InspectorError::InvalidJson(err.to_string()))?;
        let token = payload
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| InspectorError::Auth("response carried no token".to_string()))?;
        self.token = Some(token);
        Ok(())
    }

    pub async fn list_datasets(&self) -> Result<Vec<DatasetRecord>, InspectorError> {
        self.get_json(DATASETS_ENDPOINT).await
    }

    pub async fn list_files(&self, dataset_id: &str) -> Result<Vec<FileRecord>, InspectorError> {
        self.get_json(&format!("{DATASETS_ENDPOINT}/{dataset_id}/files"))
            .await
    }

    /// Raw bytes of the image at `path`, relative to the base URL.
    pub async fn fetch_thumbnail(&self, path: &str) -> Result<Vec<u8>, InspectorError> {
        let url = self.endpoint(path);
        debug!(%url, "fetching thumbnail");
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(InspectorError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(InspectorError::Api {
                status: status.as_u16(),
                message: format!("thumbnail request failed: {status}"),
            });
        }
        let bytes = response.bytes().await.map_err(InspectorError::Request)?;
        Ok(bytes.to_vec())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, InspectorError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(InspectorError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(InspectorError::Api {
                status: status.as_u16(),
                message: format!("HTTP request failed: {status}"),
            });
        }
        let bytes = response.bytes().await.map_err(InspectorError::Request)?;
        check_failure(status.as_u16(), &bytes)?;
        serde_json::from_slice(&bytes).map_err(|err| InspectorError::InvalidJson(err.to_string()))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(AUTH_HEADER, token),
            None => request,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// The service can answer 200 with `{"result": "fail"}` in the body.
fn check_failure(status: u16, bytes: &[u8]) -> Result<(), InspectorError> {
    if let Ok(body) = serde_json::from_slice::<FailureBody>(bytes) {
        if body.is_failure() {
            return Err(InspectorError::Api {
                status,
                message: body.message(),
            });
        }
    }
    Ok(())
}

pub fn normalize_base_url(raw: &str) -> Result<String, InspectorError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|err| InspectorError::InvalidUrl(format!("{trimmed}: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => Err(InspectorError::InvalidUrl(format!(
            "unsupported scheme `{other}` in {trimmed}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_slash() {
        let url = normalize_base_url("https://10.0.0.5/powerai-vision/").expect("url");
        assert_eq!(url, "https://10.0.0.5/powerai-vision");
    }

    #[test]
    fn normalize_rejects_garbage() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(InspectorError::InvalidUrl(_))
        ));
        assert!(matches!(
            normalize_base_url("ftp://host/vision"),
            Err(InspectorError::InvalidUrl(_))
        ));
    }

    #[test]
    fn check_failure_only_trips_on_fail_objects() {
        assert!(check_failure(200, br#"[{"_id": "a"}]"#).is_ok());
        assert!(check_failure(200, br#"{"result": "success"}"#).is_ok());
        assert!(check_failure(200, b"not json").is_ok());
        let err = check_failure(200, br#"{"result": "fail", "fault": "denied"}"#).unwrap_err();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = VisionClient::new(ClientOptions {
            base_url: "http://localhost:9000/vision/".to_string(),
            ..ClientOptions::default()
        })
        .expect("client");
        assert_eq!(
            client.endpoint("/uploads/thumb.jpg"),
            "http://localhost:9000/vision/uploads/thumb.jpg"
        );
        assert!(!client.is_authenticated());
    }
}
