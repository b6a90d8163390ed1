use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Environment variable holding the bearer token for the judge API.
pub const AUTH_TOKEN_VAR: &str = "HASH_CODE_JUDGE_AUTH_TOKEN";

/// Number of `HASH_CODE_INPUT{n}_NAME` / `_ID` pairs read from the environment.
pub const MAX_ENV_DATA_SETS: usize = 4;

/// Key of the solution entry holding the sources archive.
pub const SOURCES_KEY: &str = "sources";

/// Fatal configuration problems detected before any network activity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartupError {
    #[error("{0} not defined. Set it with your auth token to the Judge system.")]
    MissingCredential(String),

    #[error("no data sets configured: set HASH_CODE_INPUT1_NAME and HASH_CODE_INPUT1_ID (up to 4 pairs)")]
    NoDataSets,
}

/// A data set as declared in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DataSet {
    pub name: String,
    pub id: String,
}

/// Mapping from data-set name to its remote identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSetConfig {
    data_sets: BTreeMap<String, String>,
}

impl DataSetConfig {
    /// Reads up to [`MAX_ENV_DATA_SETS`] name/id pairs through `lookup`.
    ///
    /// A pair with only one half set (or an empty half) is treated as absent.
    pub fn resolve<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = DataSetConfig::default();
        for n in 1..=MAX_ENV_DATA_SETS {
            let name_var = format!("HASH_CODE_INPUT{n}_NAME");
            let id_var = format!("HASH_CODE_INPUT{n}_ID");
            let name = lookup(&name_var).filter(|v| !v.is_empty());
            let id = lookup(&id_var).filter(|v| !v.is_empty());
            match (name, id) {
                (Some(name), Some(id)) => {
                    debug!(data_set = %name, "[CONFIG] found data set in environment");
                    config.insert(name, id);
                }
                (None, None) => {}
                (name, id) => {
                    debug!(
                        slot = n,
                        name_set = name.is_some(),
                        id_set = id.is_some(),
                        "[CONFIG] ignoring half-configured data set"
                    );
                }
            }
        }
        config
    }

    pub fn from_env() -> Self {
        Self::resolve(|var| std::env::var(var).ok())
    }

    /// Adds a data set, replacing the identifier of an existing one with the same name.
    /// Empty values and the reserved `sources` name are skipped.
    pub fn insert(&mut self, name: String, id: String) {
        if name.is_empty() || id.is_empty() {
            debug!(data_set = %name, "[CONFIG] skipping data set with empty name or id");
            return;
        }
        if name == SOURCES_KEY {
            warn!("[CONFIG] '{SOURCES_KEY}' is reserved and cannot name a data set; skipping");
            return;
        }
        self.data_sets.insert(name, id);
    }

    /// Layers `other` on top of `self`; identifiers from `other` win on name clashes.
    pub fn merge(mut self, other: DataSetConfig) -> Self {
        for (name, id) in other.data_sets {
            self.data_sets.insert(name, id);
        }
        self
    }

    /// Fails with [`StartupError::NoDataSets`] when nothing is configured.
    pub fn require_non_empty(self) -> Result<Self, StartupError> {
        if self.data_sets.is_empty() {
            return Err(StartupError::NoDataSets);
        }
        info!(count = self.data_sets.len(), "[CONFIG] data sets resolved");
        Ok(self)
    }

    pub fn id(&self, name: &str) -> Option<&str> {
        self.data_sets.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.data_sets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.data_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_sets.is_empty()
    }
}

impl FromIterator<DataSet> for DataSetConfig {
    fn from_iter<I: IntoIterator<Item = DataSet>>(iter: I) -> Self {
        let mut config = DataSetConfig::default();
        for ds in iter {
            config.insert(ds.name, ds.id);
        }
        config
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for DataSetConfig {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(name, id)| DataSet {
                name: name.to_string(),
                id: id.to_string(),
            })
            .collect()
    }
}
