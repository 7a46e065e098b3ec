//! The persistence gateway boundary.
//!
//! The store never talks to the network itself. Every mutation it accepts
//! yields [`GatewayCall`]s that a [`PersistenceGateway`] mirrors to the
//! server after the local state has already changed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::mission::{DataFile, Mission};
use crate::responses::AnnotationResponseSet;
use crate::review::ReviewAction;
use crate::schema::MissionTaskConfig;
use crate::types::DbId;

/// Errors surfaced by a gateway implementation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// The request never produced a response (network, DNS, TLS, ...).
    #[error("Gateway request failed: {0}")]
    Request(String),

    /// The server answered with a non-2xx status.
    #[error("Gateway API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Gateway response could not be decoded: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether sending the same call again could succeed.
    ///
    /// Transport failures, 5xx responses, 408 and 429 are transient. Any
    /// other 4xx means the server refused the call itself, and an
    /// undecodable body will not decode any better the second time.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Api { status, .. } => {
                !(400..500).contains(status) || matches!(*status, 408 | 429)
            }
            Self::Decode(_) => false,
        }
    }
}

/// A raw file handed to [`PersistenceGateway::upload_files`].
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A mutation to mirror to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum GatewayCall {
    SaveTasks {
        mission_id: DbId,
        tasks: Vec<MissionTaskConfig>,
    },
    ReviewFile {
        mission_id: DbId,
        file_id: DbId,
        action: ReviewAction,
    },
    AnnotateFile {
        mission_id: DbId,
        file_id: DbId,
        label: String,
        notes: String,
    },
    SaveResponses {
        mission_id: DbId,
        file_id: DbId,
        set: AnnotationResponseSet,
    },
    JoinMission {
        mission_id: DbId,
    },
}

impl GatewayCall {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SaveTasks { .. } => "save_tasks",
            Self::ReviewFile { .. } => "review_file",
            Self::AnnotateFile { .. } => "annotate_file",
            Self::SaveResponses { .. } => "save_responses",
            Self::JoinMission { .. } => "join_mission",
        }
    }

    pub fn mission_id(&self) -> DbId {
        match self {
            Self::SaveTasks { mission_id, .. }
            | Self::ReviewFile { mission_id, .. }
            | Self::AnnotateFile { mission_id, .. }
            | Self::SaveResponses { mission_id, .. }
            | Self::JoinMission { mission_id } => *mission_id,
        }
    }
}

/// The REST boundary as seen from the client.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Full mission snapshot: schema, datasets, files, annotations, contributors.
    async fn fetch_mission(&self, mission_id: DbId) -> Result<Mission, GatewayError>;

    async fn fetch_responses(
        &self,
        mission_id: DbId,
        file_id: DbId,
    ) -> Result<AnnotationResponseSet, GatewayError>;

    /// Replace the mission's schema wholesale.
    async fn save_tasks(
        &self,
        mission_id: DbId,
        tasks: &[MissionTaskConfig],
    ) -> Result<(), GatewayError>;

    async fn review_file(
        &self,
        mission_id: DbId,
        file_id: DbId,
        action: ReviewAction,
    ) -> Result<(), GatewayError>;

    /// Store a human-readable annotation summary and advance the file to
    /// `pending_review`.
    async fn annotate_file(
        &self,
        mission_id: DbId,
        file_id: DbId,
        label: &str,
        notes: &str,
    ) -> Result<(), GatewayError>;

    async fn save_responses(
        &self,
        mission_id: DbId,
        file_id: DbId,
        set: &AnnotationResponseSet,
    ) -> Result<(), GatewayError>;

    async fn join_mission(&self, mission_id: DbId) -> Result<(), GatewayError>;

    /// Upload raw files; returns the server-assigned records.
    async fn upload_files(
        &self,
        mission_id: DbId,
        dataset_id: DbId,
        files: Vec<UploadFile>,
    ) -> Result<Vec<DataFile>, GatewayError>;
}

/// Send one queued call through `gateway`.
pub async fn deliver<G>(gateway: &G, call: &GatewayCall) -> Result<(), GatewayError>
where
    G: PersistenceGateway + ?Sized,
{
    match call {
        GatewayCall::SaveTasks { mission_id, tasks } => {
            gateway.save_tasks(*mission_id, tasks).await
        }
        GatewayCall::ReviewFile {
            mission_id,
            file_id,
            action,
        } => gateway.review_file(*mission_id, *file_id, *action).await,
        GatewayCall::AnnotateFile {
            mission_id,
            file_id,
            label,
            notes,
        } => {
            gateway
                .annotate_file(*mission_id, *file_id, label, notes)
                .await
        }
        GatewayCall::SaveResponses {
            mission_id,
            file_id,
            set,
        } => gateway.save_responses(*mission_id, *file_id, set).await,
        GatewayCall::JoinMission { mission_id } => gateway.join_mission(*mission_id).await,
    }
}
