//! Mission, dataset and file records as held by the application store.

use serde::{Deserialize, Serialize};

use crate::contributor::MissionContributor;
use crate::error::CoreError;
use crate::review::FileStatus;
use crate::schema::{resolve, MissionTaskConfig, ResolvedSchema};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Active,
    Paused,
    Completed,
    Archived,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            _ => Err(CoreError::Validation(format!(
                "Invalid mission status '{s}'. Must be one of: active, paused, completed, archived"
            ))),
        }
    }
}

/// Kind of raw data a mission collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Image,
    Text,
    Audio,
    Video,
    Tabular,
    Other,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Tabular => "tabular",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "image" => Ok(Self::Image),
            "text" => Ok(Self::Text),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "tabular" => Ok(Self::Tabular),
            "other" => Ok(Self::Other),
            _ => Err(CoreError::Validation(format!(
                "Invalid data type '{s}'. Must be one of: image, text, audio, video, tabular, other"
            ))),
        }
    }
}

/// One audit record on a file. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Server id; `None` until the gateway has stored the record.
    pub id: Option<DbId>,
    pub annotator_id: Option<DbId>,
    pub annotator_name: String,
    pub label: String,
    pub notes: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFile {
    pub id: DbId,
    pub dataset_id: DbId,
    pub filename: String,
    pub size_kb: i64,
    pub file_type: String,
    pub status: FileStatus,
    pub contributor_id: Option<DbId>,
    pub contributor_name: String,
    pub uploaded_at: Timestamp,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DbId,
    pub mission_id: DbId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub accepted_types: Option<Vec<String>>,
    #[serde(default)]
    pub files: Vec<DataFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub data_type: DataType,
    pub status: MissionStatus,
    pub goal_count: i32,
    /// Ordered annotation schema.
    #[serde(default)]
    pub tasks: Vec<MissionTaskConfig>,
    #[serde(default)]
    pub datasets: Vec<Dataset>,
    #[serde(default)]
    pub contributors: Vec<MissionContributor>,
}

impl Mission {
    pub fn resolved_schema(&self) -> ResolvedSchema {
        resolve(&self.tasks)
    }

    pub fn files(&self) -> impl Iterator<Item = &DataFile> {
        self.datasets.iter().flat_map(|d| d.files.iter())
    }

    pub fn file(&self, file_id: DbId) -> Option<&DataFile> {
        self.files().find(|f| f.id == file_id)
    }

    pub fn file_mut(&mut self, file_id: DbId) -> Option<&mut DataFile> {
        self.datasets
            .iter_mut()
            .flat_map(|d| d.files.iter_mut())
            .find(|f| f.id == file_id)
    }

    pub fn dataset_mut(&mut self, dataset_id: DbId) -> Option<&mut Dataset> {
        self.datasets.iter_mut().find(|d| d.id == dataset_id)
    }

    pub fn contributor(&self, user_id: DbId) -> Option<&MissionContributor> {
        self.contributors.iter().find(|c| c.user_id == user_id)
    }

    /// The contributor record for `user_id`, created on first use.
    pub fn contributor_entry(&mut self, user_id: DbId) -> &mut MissionContributor {
        let pos = match self.contributors.iter().position(|c| c.user_id == user_id) {
            Some(pos) => pos,
            None => {
                self.contributors.push(MissionContributor::new(user_id));
                self.contributors.len() - 1
            }
        };
        &mut self.contributors[pos]
    }

    /// Files in `status`, across all datasets.
    pub fn files_in(&self, status: FileStatus) -> impl Iterator<Item = &DataFile> {
        self.files().filter(move |f| f.status == status)
    }
}
