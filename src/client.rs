use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

const COUNT_PATH: &str = "get_count";
const STOP_PATH: &str = "stop_detection";
const LOGIN_PATH: &str = "login";
const DASHBOARD_PATH: &str = "dashboard";

/// One snapshot of the server's detector output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DetectionStatus {
    pub count: u32,
    pub alarm: bool,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {0}")]
    Status(StatusCode),
    #[error("malformed status payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid server url: {0}")]
    Url(String),
    #[error("login rejected for user {0}")]
    LoginRejected(String),
}

/// HTTP client for the detection server. Cheap to clone; clones share the
/// connection pool and the session cookie jar.
#[derive(Debug, Clone)]
pub struct StatusClient {
    http: reqwest::Client,
    base: Url,
}

impl StatusClient {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut base = Url::parse(server_url).map_err(|e| ClientError::Url(e.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::Url(e.to_string()))
    }

    /// `GET /get_count`. Any non-2xx status or non-conforming body is an error.
    pub async fn fetch_status(&self) -> Result<DetectionStatus, ClientError> {
        let resp = self.http.get(self.endpoint(COUNT_PATH)?).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }
        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// `GET /stop_detection`. The response body is ignored.
    pub async fn stop_detection(&self) -> Result<(), ClientError> {
        let resp = self.http.get(self.endpoint(STOP_PATH)?).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }
        Ok(())
    }

    /// Submit the login form. The server answers a good login with a
    /// redirect to the dashboard and re-renders the form otherwise.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.endpoint(LOGIN_PATH)?)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }
        let dashboard = self.endpoint(DASHBOARD_PATH)?;
        if resp.url().path() != dashboard.path() {
            return Err(ClientError::LoginRejected(username.to_string()));
        }

        log::info!("Logged in as {username}");
        Ok(())
    }
}
