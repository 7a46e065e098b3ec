//! Application state and its single command dispatcher.
//!
//! [`MissionStore::apply`] is the only way to mutate missions or response
//! sets. It applies a [`Command`] synchronously and returns the gateway calls
//! that mirror the change; it never performs I/O.

use std::collections::BTreeMap;

use crate::contributor::Actor;
use crate::error::CoreError;
use crate::gateway::GatewayCall;
use crate::mission::{Annotation, DataFile, Mission};
use crate::responses::{self, AnnotationResponseSet, ResponseAggregator, TaskValue};
use crate::review::{review_transition, submission_transition, FileStatus, ReviewAction};
use crate::schema::{validate_for_save, MissionTaskConfig};
use crate::types::DbId;

/// Every mutation the store accepts.
#[derive(Debug, Clone)]
pub enum Command {
    /// Replace a mission with a freshly fetched snapshot.
    LoadMission(Mission),
    /// Replace a file's response set with the persisted one.
    LoadResponses {
        mission_id: DbId,
        file_id: DbId,
        set: AnnotationResponseSet,
    },
    /// Replace the mission's schema. Reviewer only.
    SaveSchema {
        mission_id: DbId,
        actor: Actor,
        tasks: Vec<MissionTaskConfig>,
    },
    /// Approve or reject a file. Reviewer only.
    ReviewFile {
        mission_id: DbId,
        file_id: DbId,
        action: ReviewAction,
        actor: Actor,
    },
    SetValue {
        mission_id: DbId,
        file_id: DbId,
        key: String,
        value: Option<TaskValue>,
    },
    /// Persist the current response set without submitting.
    SaveDraft { mission_id: DbId, file_id: DbId },
    /// Submit a file's responses for review.
    SubmitAnnotation {
        mission_id: DbId,
        file_id: DbId,
        actor: Actor,
    },
    JoinMission { mission_id: DbId, actor: Actor },
    /// Seed records returned by an upload.
    AddFiles {
        mission_id: DbId,
        dataset_id: DbId,
        files: Vec<DataFile>,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::LoadMission(_) => "load_mission",
            Self::LoadResponses { .. } => "load_responses",
            Self::SaveSchema { .. } => "save_schema",
            Self::ReviewFile { .. } => "review_file",
            Self::SetValue { .. } => "set_value",
            Self::SaveDraft { .. } => "save_draft",
            Self::SubmitAnnotation { .. } => "submit_annotation",
            Self::JoinMission { .. } => "join_mission",
            Self::AddFiles { .. } => "add_files",
        }
    }
}

#[derive(Debug, Default)]
pub struct MissionStore {
    missions: BTreeMap<DbId, Mission>,
    responses: ResponseAggregator,
}

impl MissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mission(&self, mission_id: DbId) -> Option<&Mission> {
        self.missions.get(&mission_id)
    }

    pub fn missions(&self) -> impl Iterator<Item = &Mission> {
        self.missions.values()
    }

    pub fn responses(&self) -> &ResponseAggregator {
        &self.responses
    }

    pub fn response_set(&self, mission_id: DbId, file_id: DbId) -> Option<&AnnotationResponseSet> {
        self.responses.get(mission_id, file_id)
    }

    /// Whether the submit control should be enabled for a file.
    ///
    /// [`Command::SubmitAnnotation`] itself does not check completeness.
    pub fn can_submit(&self, mission_id: DbId, file_id: DbId) -> bool {
        let Some(mission) = self.missions.get(&mission_id) else {
            return false;
        };
        let in_annotation = mission
            .file(file_id)
            .is_some_and(|f| f.status == FileStatus::NeedsAnnotation);
        let tasks = mission.resolved_schema().tasks;
        in_annotation && self.responses.is_complete(&tasks, mission_id, file_id)
    }

    /// Apply a command and return the calls that mirror it.
    pub fn apply(&mut self, command: Command) -> Result<Vec<GatewayCall>, CoreError> {
        let name = command.name();
        let calls = match command {
            Command::LoadMission(mission) => {
                tracing::debug!(mission_id = mission.id, "Mission snapshot loaded");
                self.missions.insert(mission.id, mission);
                Vec::new()
            }
            Command::LoadResponses {
                mission_id,
                file_id,
                set,
            } => {
                self.responses.load(mission_id, file_id, set);
                Vec::new()
            }
            Command::SaveSchema {
                mission_id,
                actor,
                tasks,
            } => self.save_schema(mission_id, &actor, tasks)?,
            Command::ReviewFile {
                mission_id,
                file_id,
                action,
                actor,
            } => self.review_file(mission_id, file_id, action, &actor)?,
            Command::SetValue {
                mission_id,
                file_id,
                key,
                value,
            } => {
                self.responses.set_value(mission_id, file_id, key, value);
                Vec::new()
            }
            Command::SaveDraft {
                mission_id,
                file_id,
            } => vec![GatewayCall::SaveResponses {
                mission_id,
                file_id,
                set: self
                    .responses
                    .get(mission_id, file_id)
                    .cloned()
                    .unwrap_or_default(),
            }],
            Command::SubmitAnnotation {
                mission_id,
                file_id,
                actor,
            } => self.submit_annotation(mission_id, file_id, &actor),
            Command::JoinMission { mission_id, actor } => {
                let mission = self.mission_mut(mission_id)?;
                mission.contributor_entry(actor.user_id);
                vec![GatewayCall::JoinMission { mission_id }]
            }
            Command::AddFiles {
                mission_id,
                dataset_id,
                files,
            } => {
                let mission = self.mission_mut(mission_id)?;
                let uploaders: Vec<DbId> = files.iter().filter_map(|f| f.contributor_id).collect();
                let dataset = mission.dataset_mut(dataset_id).ok_or(CoreError::NotFound {
                    entity: "Dataset",
                    id: dataset_id,
                })?;
                dataset.files.extend(files);
                for uploader in uploaders {
                    mission.contributor_entry(uploader).record_upload();
                }
                Vec::new()
            }
        };
        tracing::trace!(command = name, calls = calls.len(), "Command applied");
        Ok(calls)
    }

    fn mission_mut(&mut self, mission_id: DbId) -> Result<&mut Mission, CoreError> {
        self.missions.get_mut(&mission_id).ok_or(CoreError::NotFound {
            entity: "Mission",
            id: mission_id,
        })
    }

    fn save_schema(
        &mut self,
        mission_id: DbId,
        actor: &Actor,
        tasks: Vec<MissionTaskConfig>,
    ) -> Result<Vec<GatewayCall>, CoreError> {
        let mission = self.mission_mut(mission_id)?;
        actor.require_reviewer(mission.contributor(actor.user_id))?;
        validate_for_save(&tasks)?;

        mission.tasks = tasks.clone();
        tracing::info!(
            mission_id,
            user_id = actor.user_id,
            task_count = tasks.len(),
            "Mission schema saved"
        );
        Ok(vec![GatewayCall::SaveTasks { mission_id, tasks }])
    }

    fn review_file(
        &mut self,
        mission_id: DbId,
        file_id: DbId,
        action: ReviewAction,
        actor: &Actor,
    ) -> Result<Vec<GatewayCall>, CoreError> {
        let Some(mission) = self.missions.get_mut(&mission_id) else {
            tracing::debug!(mission_id, file_id, "Review ignored: mission not loaded");
            return Ok(Vec::new());
        };
        actor.require_reviewer(mission.contributor(actor.user_id))?;

        let Some(file) = mission.file_mut(file_id) else {
            tracing::debug!(mission_id, file_id, "Review ignored: file not in mission");
            return Ok(Vec::new());
        };
        let Some(transition) = review_transition(file.status, action) else {
            tracing::debug!(
                mission_id,
                file_id,
                status = %file.status,
                action = action.as_str(),
                "Review ignored: no transition defined"
            );
            return Ok(Vec::new());
        };

        file.status = transition.to;
        let uploader = file.contributor_id;
        if transition.counts_approval {
            if let Some(uploader) = uploader {
                mission.contributor_entry(uploader).record_approval();
            }
        }

        tracing::info!(
            mission_id,
            file_id,
            action = action.as_str(),
            from = %transition.from,
            to = %transition.to,
            "File reviewed"
        );
        Ok(vec![GatewayCall::ReviewFile {
            mission_id,
            file_id,
            action,
        }])
    }

    fn submit_annotation(&mut self, mission_id: DbId, file_id: DbId, actor: &Actor) -> Vec<GatewayCall> {
        let Some(mission) = self.missions.get_mut(&mission_id) else {
            tracing::debug!(mission_id, file_id, "Submit ignored: mission not loaded");
            return Vec::new();
        };
        let tasks = mission.resolved_schema().tasks;
        let Some(file) = mission.file_mut(file_id) else {
            tracing::debug!(mission_id, file_id, "Submit ignored: file not in mission");
            return Vec::new();
        };
        let Some(transition) = submission_transition(file.status) else {
            tracing::debug!(mission_id, file_id, status = %file.status, "Submit ignored: file not awaiting annotation");
            return Vec::new();
        };

        let set = self
            .responses
            .get(mission_id, file_id)
            .cloned()
            .unwrap_or_default();
        let (label, notes) = responses::submission_summary(&tasks, Some(&set));

        file.status = transition.to;
        file.annotations.push(Annotation {
            id: None,
            annotator_id: Some(actor.user_id),
            annotator_name: actor.name.clone(),
            label: label.clone(),
            notes: notes.clone(),
            created_at: chrono::Utc::now(),
        });

        tracing::info!(
            mission_id,
            file_id,
            user_id = actor.user_id,
            from = %transition.from,
            to = %transition.to,
            "Annotation submitted"
        );
        vec![
            GatewayCall::SaveResponses {
                mission_id,
                file_id,
                set,
            },
            GatewayCall::AnnotateFile {
                mission_id,
                file_id,
                label,
                notes,
            },
        ]
    }
}
