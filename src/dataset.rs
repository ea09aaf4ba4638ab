//! Static problem dataset: a JSON array of `{id, title, problem_description, ...}`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::CoachError;

/// One coding exercise. Fields beyond the three the views use are kept
/// verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub problem_description: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Problem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        problem_description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            problem_description: problem_description.into(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProblemSet {
    problems: Vec<Problem>,
}

impl ProblemSet {
    pub fn new(problems: Vec<Problem>) -> Self {
        Self { problems }
    }

    pub fn from_json(text: &str) -> Result<Self, CoachError> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// Read the dataset from a local file.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Self, CoachError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CoachError::DatasetIo { path: path.to_path_buf(), source })?;
        let set = Self::from_json(&text)?;
        debug!(path = %path.display(), problems = set.len(), "loaded problem dataset");
        Ok(set)
    }

    /// `GET` the dataset document from a URL.
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self, CoachError> {
        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CoachError::Status { status: response.status().as_u16(), url: url.to_string() });
        }
        let text = response.text().await?;
        let set = Self::from_json(&text)?;
        debug!(url, problems = set.len(), "fetched problem dataset");
        Ok(set)
    }

    /// Load from `source`, which is either an `http(s)://` URL or a file path.
    pub async fn load(source: &str) -> Result<Self, CoachError> {
        let set = if source.starts_with("http://") || source.starts_with("https://") {
            Self::fetch(&reqwest::Client::new(), source).await?
        } else {
            Self::load_file(source).await?
        };
        if set.is_empty() {
            warn!(source, "problem dataset is empty; every lookup will miss");
        }
        Ok(set)
    }

    pub fn find(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}
