use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::models::{TaskId, short_sha};
use crate::errors::ArtifactError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Plain-language explanation of a commit.
    Explanation,
    /// Code-risk analysis of a commit.
    Analysis,
    /// Report on a task's progress as of a selected commit.
    Report,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [Self::Explanation, Self::Analysis, Self::Report];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Explanation => "explanation",
            Self::Analysis => "analysis",
            Self::Report => "report",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Explanation => "commit explanation",
            Self::Analysis => "code analysis",
            Self::Report => "task report",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Explanation => "Commit Explanation",
            Self::Analysis => "Code Analysis",
            Self::Report => "Task Report",
        }
    }

    /// Static precondition on the key. A card whose key fails this check is
    /// disabled and never touches the network.
    pub fn check_key(&self, key: &ArtifactKey) -> Result<(), ArtifactError> {
        if key.commit_sha.as_deref().is_none_or(|s| s.trim().is_empty()) {
            return Err(ArtifactError::MissingCommit { kind: self.label() });
        }
        if *self == Self::Report && key.task_id.is_none() {
            return Err(ArtifactError::MissingTask { kind: self.label() });
        }
        Ok(())
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "explanation" | "explain" => Ok(Self::Explanation),
            "analysis" | "analyze" => Ok(Self::Analysis),
            "report" => Ok(Self::Report),
            other => Err(ArtifactError::UnknownKind(other.to_string())),
        }
    }
}

/// Identifies one artifact: a commit, optionally scoped to a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

impl ArtifactKey {
    pub fn new(task_id: Option<TaskId>, commit_sha: Option<String>) -> Self {
        Self {
            task_id,
            commit_sha,
        }
    }

    pub fn commit(sha: impl Into<String>) -> Self {
        Self {
            task_id: None,
            commit_sha: Some(sha.into()),
        }
    }

    pub fn task_commit(task_id: TaskId, sha: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id),
            commit_sha: Some(sha.into()),
        }
    }

    /// Short identifying fragment used in file names and headers.
    pub fn fragment(&self) -> String {
        match (self.task_id, self.commit_sha.as_deref()) {
            (Some(task), Some(sha)) => format!("task{}-{}", task, short_sha(sha)),
            (None, Some(sha)) => short_sha(sha).to_string(),
            (Some(task), None) => format!("task{}", task),
            (None, None) => "unscoped".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    Quick,
    #[default]
    Standard,
    Deep,
}

impl AnalysisDepth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Standard => "standard",
            Self::Deep => "deep",
        }
    }
}

impl std::fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisDepth {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(Self::Quick),
            "standard" => Ok(Self::Standard),
            "deep" => Ok(Self::Deep),
            _ => Err(ArtifactError::UnknownDepth(s.to_string())),
        }
    }
}

/// Parameters of a generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Discard and overwrite any cached artifact for the key.
    #[serde(default)]
    pub force_regenerate: bool,
    pub language: String,
    #[serde(default)]
    pub depth: AnalysisDepth,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            force_regenerate: false,
            language: "en".to_string(),
            depth: AnalysisDepth::default(),
        }
    }
}

/// An AI-generated text result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub key: ArtifactKey,
    pub content: String,
    /// The store served a previously generated result.
    #[serde(default)]
    pub cached: bool,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub depth: Option<AnalysisDepth>,
}

// Wire payloads

/// Query string of an artifact read.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtifactQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(default)]
    pub cache_only: bool,
}

impl ArtifactQuery {
    pub fn new(key: &ArtifactKey, cache_only: bool) -> Self {
        Self {
            task_id: key.task_id,
            commit_sha: key.commit_sha.clone(),
            cache_only,
        }
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(self.task_id, self.commit_sha.clone())
    }
}

/// Body of a generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub key: ArtifactKey,
    #[serde(flatten)]
    pub options: GenerateOptions,
}
