#![doc = "HTTP client for the judge service: implements the core `JudgeApi` contract over reqwest."]
//
//! # Judge client
//!
//! [`JudgeClient`] wires the [`JudgeApi`] trait from `judge-upload-core` to the
//! remote judge REST API. It owns one `reqwest::Client` (and so one connection
//! pool) and the bearer token, and attaches `Authorization: Bearer <token>` to
//! every request.
//!
//! - `GET {api_base}/upload/createUrl` → `{ "value": <upload uri> }`
//! - `POST <upload uri>` (multipart field `file`) → `{ "file": [<blob key>, ...] }`
//! - `POST {api_base}/submissions?dataSet=&submissionBlobKey=&sourcesBlobKey=` → raw acknowledgement
//!
//! No retries and no timeouts beyond reqwest defaults.

use std::error::Error as StdError;
use std::path::Path;

use async_trait::async_trait;
use judge_upload_core::contract::{ApiError, BlobKey, Endpoint, JudgeApi, SubmissionAck};
use judge_upload_core::redact::shorten;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::fs::File;

use crate::load_config::Settings;

#[derive(Debug, Deserialize)]
struct CreateUrlResponse {
    value: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: Vec<String>,
}

pub struct JudgeClient {
    http: Client,
    token: SecretString,
    create_url_uri: String,
    submit_uri: String,
}

impl JudgeClient {
    pub fn new(api_base: &str, token: SecretString) -> Self {
        let api_base = api_base.trim_end_matches('/');
        tracing::info!(
            api_base,
            token = %shorten(token.expose_secret()),
            "Initialized JudgeClient"
        );
        JudgeClient {
            http: Client::new(),
            token,
            create_url_uri: format!("{api_base}/upload/createUrl"),
            submit_uri: format!("{api_base}/submissions"),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.api_base, settings.token.clone())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.token.expose_secret())
    }

    async fn send(&self, endpoint: Endpoint, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%endpoint, status = status.as_u16(), "Request returned error status");
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn read_json<T>(endpoint: Endpoint, response: Response) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
    {
        response.json::<T>().await.map_err(|e| {
            let message = error_text(e);
            tracing::error!(%endpoint, error = %message, "Malformed response body");
            ApiError::ResponseFormat { endpoint, message }
        })
    }
}

/// Error text with its causes and without the request URL, which carries upload URIs and blob keys.
fn error_text(e: reqwest::Error) -> String {
    let e = e.without_url();
    let mut message = e.to_string();
    let mut cause = StdError::source(&e);
    while let Some(inner) = cause {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        cause = inner.source();
    }
    message
}

fn transport_error(endpoint: Endpoint, e: reqwest::Error) -> ApiError {
    let url = e.url().map(|u| shorten(u.as_str())).unwrap_or_default();
    let message = error_text(e);
    tracing::error!(%endpoint, url = %url, error = %message, "Request failed");
    ApiError::Transport { endpoint, message }
}

#[async_trait]
impl JudgeApi for JudgeClient {
    async fn create_upload_url(&self) -> Result<String, ApiError> {
        let endpoint = Endpoint::CreateUrl;
        let response = self
            .send(endpoint, self.http.get(&self.create_url_uri))
            .await?;
        let body: CreateUrlResponse = Self::read_json(endpoint, response).await?;
        tracing::debug!(upload_url = %shorten(&body.value), "Obtained upload URL");
        Ok(body.value)
    }

    async fn upload_file(&self, upload_url: &str, path: &Path) -> Result<BlobKey, ApiError> {
        let endpoint = Endpoint::Upload;
        let io_error = |e: std::io::Error| {
            tracing::error!(file = %path.display(), error = %e, "Failed to open file for upload");
            ApiError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        };
        let file = File::open(path).await.map_err(io_error)?;
        let length = file.metadata().await.map_err(io_error)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        tracing::info!(
            file = %path.display(),
            bytes = length,
            upload_url = %shorten(upload_url),
            "Uploading file"
        );

        // The file is streamed from disk; the handle drops with the request.
        let part = Part::stream_with_length(Body::from(file), length).file_name(file_name);
        let form = Form::new().part("file", part);
        let response = self
            .send(endpoint, self.http.post(upload_url).multipart(form))
            .await?;
        let body: UploadResponse = Self::read_json(endpoint, response).await?;

        match body.file.into_iter().next() {
            Some(key) => {
                tracing::info!(file = %path.display(), key = %shorten(&key), "Uploaded file");
                Ok(BlobKey::new(key))
            }
            None => Err(ApiError::ResponseFormat {
                endpoint,
                message: "`file` array is empty".to_string(),
            }),
        }
    }

    async fn submit(
        &self,
        data_set_id: &str,
        submission: &BlobKey,
        sources: &BlobKey,
    ) -> Result<SubmissionAck, ApiError> {
        let endpoint = Endpoint::Submissions;
        tracing::info!(
            data_set_id,
            submission = %shorten(submission.as_str()),
            sources = %shorten(sources.as_str()),
            "Submitting data set"
        );
        let request = self.http.post(&self.submit_uri).query(&[
            ("dataSet", data_set_id),
            ("submissionBlobKey", submission.as_str()),
            ("sourcesBlobKey", sources.as_str()),
        ]);
        let response = self.send(endpoint, request).await?;
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(endpoint, e))?;
        tracing::info!(data_set_id, "Submission acknowledged");
        Ok(SubmissionAck(body))
    }
}
