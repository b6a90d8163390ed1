//! # contract: interface to the remote judge service
//!
//! This module defines the [`JudgeApi`] trait and the plain data types that flow
//! through it. The workflow in [`crate::submit`] only talks to the judge through
//! this trait, so the HTTP client and test fakes are interchangeable.
//!
//! ## Operations
//! - [`JudgeApi::create_upload_url`]: obtain a single-use upload destination.
//! - [`JudgeApi::upload_file`]: send one local file to that destination, yielding a [`BlobKey`].
//! - [`JudgeApi::submit`]: register a submission for a data set.
//!
//! Every call is independent and stateless; implementors carry the bearer
//! credential and the transport themselves.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; `MockJudgeApi` is exported with the
//!   default `test-export-mocks` feature so integration tests can script the service.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use thiserror::Error;

use crate::redact::shorten;

/// Opaque reference to a file stored by the judge service.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BlobKey(String);

impl BlobKey {
    pub fn new(key: impl Into<String>) -> Self {
        BlobKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keys act as capabilities, so Debug output is shortened like any other token.
impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", shorten(&self.0))
    }
}

/// Raw acknowledgement body returned by the submission endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubmissionAck(pub String);

/// Which remote call an [`ApiError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    CreateUrl,
    Upload,
    Submissions,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::CreateUrl => "createUrl",
            Endpoint::Upload => "upload",
            Endpoint::Submissions => "submissions",
        };
        f.write_str(name)
    }
}

/// Failure of a single remote call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{endpoint} request failed: {message}")]
    Transport { endpoint: Endpoint, message: String },

    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        endpoint: Endpoint,
        status: u16,
        body: String,
    },

    #[error("{endpoint} returned an unexpected body: {message}")]
    ResponseFormat { endpoint: Endpoint, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            ApiError::Transport { endpoint, .. }
            | ApiError::Status { endpoint, .. }
            | ApiError::ResponseFormat { endpoint, .. } => Some(*endpoint),
            ApiError::Io { .. } => None,
        }
    }
}

/// The three remote operations of the judge service.
///
/// Implemented by the HTTP client in the CLI crate and by `MockJudgeApi` in tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait JudgeApi: Send + Sync {
    /// Request a single-use upload destination URI.
    async fn create_upload_url(&self) -> Result<String, ApiError>;

    /// Upload the file at `path` to `upload_url` and return its blob key.
    ///
    /// The file must be closed again once the request completes or fails.
    async fn upload_file(&self, upload_url: &str, path: &Path) -> Result<BlobKey, ApiError>;

    /// Register `submission` against the data set with remote id `data_set_id`.
    async fn submit(
        &self,
        data_set_id: &str,
        submission: &BlobKey,
        sources: &BlobKey,
    ) -> Result<SubmissionAck, ApiError>;
}
