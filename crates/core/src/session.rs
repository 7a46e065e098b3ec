//! A client session: the store plus everything needed to persist it.
//!
//! Mutations go through [`Session::dispatch`], which applies them locally
//! first and then mirrors the resulting calls through the outbox. A gateway
//! failure never rolls local state back. A transient failure stays queued
//! until [`Session::retry_pending`] delivers it; a call the server refuses
//! lands in [`Outbox::dead`] and a [`Session::refresh_mission`] brings the
//! local copy back in line.

use crate::error::CoreError;
use crate::gateway::{GatewayError, PersistenceGateway, UploadFile};
use crate::mission::DataFile;
use crate::outbox::{FlushReport, Outbox};
use crate::store::{Command, MissionStore};
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub struct Session<G> {
    store: MissionStore,
    outbox: Outbox,
    gateway: G,
}

impl<G: PersistenceGateway> Session<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            store: MissionStore::new(),
            outbox: Outbox::new(),
            gateway,
        }
    }

    pub fn store(&self) -> &MissionStore {
        &self.store
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Apply `command` and deliver whatever it queued.
    ///
    /// A rejected command leaves the store and the outbox untouched. Delivery
    /// failures are reported in the returned [`FlushReport`], not as errors.
    pub async fn dispatch(&mut self, command: Command) -> Result<FlushReport, CoreError> {
        for call in self.store.apply(command)? {
            self.outbox.push(call);
        }
        Ok(self.outbox.flush(&self.gateway).await)
    }

    /// Deliver queued calls that previously failed.
    pub async fn retry_pending(&mut self) -> FlushReport {
        if !self.outbox.is_empty() {
            tracing::info!(pending = self.outbox.len(), "Retrying queued gateway calls");
        }
        self.outbox.flush(&self.gateway).await
    }

    /// Re-fetch a mission and replace the local copy with it.
    ///
    /// The most recent fetch wins, including over optimistic changes whose
    /// calls are still queued.
    pub async fn refresh_mission(&mut self, mission_id: DbId) -> Result<(), SessionError> {
        let mission = self.gateway.fetch_mission(mission_id).await?;
        self.store.apply(Command::LoadMission(mission))?;
        Ok(())
    }

    /// Fetch the persisted response set for a file, replacing the local one.
    pub async fn load_responses(
        &mut self,
        mission_id: DbId,
        file_id: DbId,
    ) -> Result<(), SessionError> {
        let set = self.gateway.fetch_responses(mission_id, file_id).await?;
        self.store.apply(Command::LoadResponses {
            mission_id,
            file_id,
            set,
        })?;
        Ok(())
    }

    /// Upload files and add the server's records to the store.
    ///
    /// Unlike other mutations this waits for the server, because the file
    /// ids only exist once it has stored them.
    pub async fn upload_files(
        &mut self,
        mission_id: DbId,
        dataset_id: DbId,
        files: Vec<UploadFile>,
    ) -> Result<Vec<DataFile>, SessionError> {
        let count = files.len();
        let stored = self
            .gateway
            .upload_files(mission_id, dataset_id, files)
            .await?;
        tracing::info!(mission_id, dataset_id, count, "Files uploaded");

        self.store.apply(Command::AddFiles {
            mission_id,
            dataset_id,
            files: stored.clone(),
        })?;
        Ok(stored)
    }
}
