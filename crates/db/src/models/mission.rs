//! Mission entity model and DTOs.

use crowdlabel_core::contributor::MissionContributor;
use crowdlabel_core::mission::{DataType, Dataset, Mission, MissionStatus};
use crowdlabel_core::schema::MissionTaskConfig;
use crowdlabel_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `missions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MissionRow {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub data_type: String,
    pub status: String,
    pub goal_count: i32,
    pub tasks: Json<Vec<MissionTaskConfig>>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MissionRow {
    /// Assemble the full domain mission from this row and its children.
    pub fn into_core(
        self,
        datasets: Vec<Dataset>,
        contributors: Vec<MissionContributor>,
    ) -> Result<Mission, sqlx::Error> {
        Ok(Mission {
            id: self.id,
            title: self.title,
            description: self.description,
            data_type: DataType::from_str(&self.data_type).map_err(super::decode_error)?,
            status: MissionStatus::from_str(&self.status).map_err(super::decode_error)?,
            goal_count: self.goal_count,
            tasks: self.tasks.0,
            datasets,
            contributors,
        })
    }
}

/// One page of missions plus the total matching the filter.
#[derive(Debug, Clone, Serialize)]
pub struct MissionPage {
    pub items: Vec<MissionRow>,
    pub total: i64,
}

/// DTO for creating a mission.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMission {
    pub title: String,
    pub description: Option<String>,
    pub data_type: String,
    pub goal_count: Option<i32>,
    /// Initial schema. Defaults to empty.
    #[serde(default)]
    pub tasks: Vec<MissionTaskConfig>,
}

/// DTO for updating mission metadata. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMission {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub goal_count: Option<i32>,
}
