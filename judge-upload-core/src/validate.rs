//! Solution validation.
//!
//! A raw solution is a JSON object mapping keys to local file paths. Each key
//! must be a configured data-set name or the literal `sources`; `sources` is
//! mandatory and at least one data set must accompany it. All violations are
//! reported together.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error};

use crate::config::{DataSetConfig, SOURCES_KEY};

/// Minimum number of keys in a solution: one data set plus `sources`.
pub const MIN_SOLUTION_KEYS: usize = 2;

/// Output file of one data set, with the identifier it is submitted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub data_set_id: String,
    pub path: PathBuf,
}

/// A validated solution: per-data-set output files plus the shared sources file.
///
/// Only [`validate_solution`] and [`Solution::from_paths`] produce one, so every
/// value holds `sources` and at least one configured data set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    sources: PathBuf,
    outputs: BTreeMap<String, OutputFile>,
}

impl Solution {
    /// Builds a raw solution from paths and validates it against `data_sets`.
    pub fn from_paths<I, P>(
        outputs: I,
        sources: impl AsRef<Path>,
        data_sets: &DataSetConfig,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (String, P)>,
        P: AsRef<Path>,
    {
        let mut raw = Map::new();
        for (name, path) in outputs {
            raw.insert(name, Value::String(path_to_string(path.as_ref())));
        }
        raw.insert(
            SOURCES_KEY.to_string(),
            Value::String(path_to_string(sources.as_ref())),
        );
        validate_solution(&Value::Object(raw), data_sets)
    }

    pub fn sources(&self) -> &Path {
        &self.sources
    }

    /// Output files keyed by data-set name.
    pub fn outputs(&self) -> &BTreeMap<String, OutputFile> {
        &self.outputs
    }

    /// Every file of the solution keyed as in the raw object, `sources` included.
    pub fn files(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.outputs
            .iter()
            .map(|(name, output)| (name.as_str(), output.path.as_path()))
            .chain(std::iter::once((SOURCES_KEY, self.sources.as_path())))
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    NotAnObject,
    TooFewKeys { found: usize },
    MissingSources,
    UnknownKey(String),
    NotAString(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NotAnObject => write!(f, "solution must be an object"),
            Violation::TooFewKeys { found } => write!(
                f,
                "solution must have at least {MIN_SOLUTION_KEYS} keys, found {found}"
            ),
            Violation::MissingSources => write!(f, "\"{SOURCES_KEY}\" is required"),
            Violation::UnknownKey(key) => {
                write!(f, "\"{key}\" is neither a configured data set nor \"{SOURCES_KEY}\"")
            }
            Violation::NotAString(key) => write!(f, "\"{key}\" must be a string path"),
        }
    }
}

/// Returned when a solution fails validation; lists every violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid solution parameters: {}", join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validates `raw` against the configured data sets.
pub fn validate_solution(
    raw: &Value,
    data_sets: &DataSetConfig,
) -> Result<Solution, ValidationError> {
    let Some(object) = raw.as_object() else {
        error!("[VALIDATE] solution is not an object");
        return Err(ValidationError {
            violations: vec![Violation::NotAnObject],
        });
    };

    let mut violations = Vec::new();
    if object.len() < MIN_SOLUTION_KEYS {
        violations.push(Violation::TooFewKeys {
            found: object.len(),
        });
    }

    let mut sources = None;
    let mut outputs = BTreeMap::new();
    for (key, value) in object {
        let data_set_id = data_sets.id(key);
        if key != SOURCES_KEY && data_set_id.is_none() {
            violations.push(Violation::UnknownKey(key.clone()));
            continue;
        }
        let Some(path) = value.as_str() else {
            violations.push(Violation::NotAString(key.clone()));
            continue;
        };
        match data_set_id {
            Some(id) => {
                outputs.insert(
                    key.clone(),
                    OutputFile {
                        data_set_id: id.to_string(),
                        path: PathBuf::from(path),
                    },
                );
            }
            None => sources = Some(PathBuf::from(path)),
        }
    }

    if !object.contains_key(SOURCES_KEY) {
        violations.push(Violation::MissingSources);
    }

    match sources {
        Some(sources) if violations.is_empty() => {
            debug!(data_sets = outputs.len(), "[VALIDATE] solution accepted");
            Ok(Solution { sources, outputs })
        }
        _ => {
            let err = ValidationError { violations };
            error!(error = %err, "[VALIDATE] solution rejected");
            Err(err)
        }
    }
}
