//! High-level workflow: validate → upload → submit.
//!
//! This module orchestrates one submission run against the judge service:
//!   - Validates the raw solution against the configured data sets
//!   - Uploads every file (each data-set output plus `sources`) through [`JudgeApi`]
//!   - Submits every data-set output together with the shared sources blob key
//!   - Returns a [`SubmissionReport`] of the service acknowledgements
//!
//! # Concurrency
//! Uploads are issued together and awaited as a group, then submissions the
//! same way. Each upload's two calls (create URL, send file) stay sequential.
//! A failure does not cancel sibling calls already in flight; the first error
//! in key order is returned once the group has finished.
//!
//! # Error Handling
//! Nothing is retried or rolled back. Uploads or submissions that completed
//! before a failure stay on the service.

use std::collections::BTreeMap;
use std::path::Path;

use futures::future::{join, join_all};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{DataSetConfig, SOURCES_KEY};
use crate::contract::{ApiError, BlobKey, JudgeApi, SubmissionAck};
use crate::redact::shorten;
use crate::validate::{validate_solution, Solution, ValidationError};

/// Blob keys of every uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedSolution {
    pub sources: BlobKey,
    pub outputs: BTreeMap<String, BlobKey>,
}

/// Acknowledgement per submitted data set.
pub type SubmissionReport = BTreeMap<String, SubmissionAck>;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("upload of '{key}' failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: ApiError,
    },

    #[error("submission for data set '{data_set}' failed: {source}")]
    Submit {
        data_set: String,
        #[source]
        source: ApiError,
    },
}

/// Uploads one file: obtain an upload URL, then send the file to it.
pub async fn upload<A>(api: &A, path: &Path) -> Result<BlobKey, ApiError>
where
    A: JudgeApi + ?Sized,
{
    let upload_url = api.create_upload_url().await?;
    debug!(
        file = %path.display(),
        upload_url = %shorten(&upload_url),
        "[UPLOAD] uploading file"
    );
    let blob_key = api.upload_file(&upload_url, path).await?;
    debug!(
        file = %path.display(),
        key = %shorten(blob_key.as_str()),
        "[UPLOAD] uploaded file"
    );
    Ok(blob_key)
}

/// Uploads every file of `solution` concurrently.
pub async fn upload_all<A>(api: &A, solution: &Solution) -> Result<UploadedSolution, WorkflowError>
where
    A: JudgeApi + ?Sized,
{
    let outputs = solution.outputs();
    info!(files = outputs.len() + 1, "[UPLOAD] starting uploads");

    let (output_results, sources_result) = join(
        join_all(outputs.values().map(|output| upload(api, &output.path))),
        upload(api, solution.sources()),
    )
    .await;

    let mut uploaded = BTreeMap::new();
    for ((name, output), result) in outputs.iter().zip(output_results) {
        let blob_key = result.map_err(|e| upload_failed(name, &output.path, e))?;
        uploaded.insert(name.clone(), blob_key);
    }
    let sources =
        sources_result.map_err(|e| upload_failed(SOURCES_KEY, solution.sources(), e))?;

    info!(files = uploaded.len() + 1, "[UPLOAD] all uploads succeeded");
    Ok(UploadedSolution {
        sources,
        outputs: uploaded,
    })
}

fn upload_failed(key: &str, path: &Path, source: ApiError) -> WorkflowError {
    error!(key, file = %path.display(), error = %source, "[UPLOAD][ERROR] upload failed");
    WorkflowError::Upload {
        key: key.to_string(),
        source,
    }
}

/// Runs upload and submission for an already validated solution.
pub async fn submit_validated<A>(
    api: &A,
    solution: &Solution,
) -> Result<SubmissionReport, WorkflowError>
where
    A: JudgeApi + ?Sized,
{
    let uploaded = upload_all(api, solution).await?;

    let submissions: Vec<(&str, &str, &BlobKey)> = solution
        .outputs()
        .iter()
        .zip(uploaded.outputs.values())
        .map(|((name, output), blob_key)| (name.as_str(), output.data_set_id.as_str(), blob_key))
        .collect();

    info!(data_sets = submissions.len(), "[SUBMIT] starting submissions");
    let results = join_all(submissions.iter().map(|(name, data_set_id, blob_key)| {
        debug!(
            data_set = %name,
            key = %shorten(blob_key.as_str()),
            "[SUBMIT] submitting data set"
        );
        api.submit(data_set_id, blob_key, &uploaded.sources)
    }))
    .await;

    let mut report = SubmissionReport::new();
    for ((name, _, _), result) in submissions.into_iter().zip(results) {
        match result {
            Ok(ack) => {
                info!(data_set = %name, "[SUBMIT] submission accepted");
                report.insert(name.to_string(), ack);
            }
            Err(e) => {
                error!(data_set = %name, error = %e, "[SUBMIT][ERROR] submission failed");
                return Err(WorkflowError::Submit {
                    data_set: name.to_string(),
                    source: e,
                });
            }
        }
    }
    Ok(report)
}

/// Entrypoint: validate `raw`, upload its files and submit each data set.
pub async fn submit_solution<A>(
    api: &A,
    data_sets: &DataSetConfig,
    raw: &Value,
) -> Result<SubmissionReport, WorkflowError>
where
    A: JudgeApi + ?Sized,
{
    info!("[SUBMIT] starting submission workflow");
    let solution = validate_solution(raw, data_sets)?;
    submit_validated(api, &solution).await
}
