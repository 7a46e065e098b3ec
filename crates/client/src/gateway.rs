//! REST client for the mission endpoints.

use async_trait::async_trait;
use crowdlabel_core::gateway::{GatewayError, PersistenceGateway, UploadFile};
use crowdlabel_core::mission::{DataFile, Mission};
use crowdlabel_core::responses::AnnotationResponseSet;
use crowdlabel_core::review::ReviewAction;
use crowdlabel_core::schema::MissionTaskConfig;
use crowdlabel_core::types::DbId;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ClientConfig;

/// List endpoints wrap their payload as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// [`PersistenceGateway`] over HTTP.
pub struct HttpGateway {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpGateway {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Reuse an existing [`reqwest::Client`] and its connection pool.
    pub fn with_client(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn mission_url(&self, mission_id: DbId, rest: &str) -> String {
        format!("{}/missions/{mission_id}{rest}", self.config.api_url)
    }

    fn file_url(&self, mission_id: DbId, file_id: DbId, rest: &str) -> String {
        self.mission_url(mission_id, &format!("/files/{file_id}{rest}"))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;
        Self::ensure_success(response).await
    }

    // ---- private helpers ----

    /// Turn a non-2xx response into [`GatewayError::Api`] carrying the body.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;
        decode(&bytes)
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, GatewayError> {
    serde_json::from_slice(bytes).map_err(|e| GatewayError::Decode(e.to_string()))
}

fn upload_form(files: Vec<UploadFile>) -> Result<reqwest::multipart::Form, GatewayError> {
    let mut form = reqwest::multipart::Form::new();
    for file in files {
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(&file.content_type)
            .map_err(|e| GatewayError::Request(format!("invalid content type: {e}")))?;
        form = form.part("file", part);
    }
    Ok(form)
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn fetch_mission(&self, mission_id: DbId) -> Result<Mission, GatewayError> {
        let response = self
            .send(self.client.get(self.mission_url(mission_id, "")))
            .await?;
        Self::parse_response(response).await
    }

    async fn fetch_responses(
        &self,
        mission_id: DbId,
        file_id: DbId,
    ) -> Result<AnnotationResponseSet, GatewayError> {
        let url = self.file_url(mission_id, file_id, "/responses");
        let response = self.send(self.client.get(url)).await?;
        Self::parse_response(response).await
    }

    async fn save_tasks(
        &self,
        mission_id: DbId,
        tasks: &[MissionTaskConfig],
    ) -> Result<(), GatewayError> {
        let url = self.mission_url(mission_id, "/tasks");
        self.send(self.client.post(url).json(tasks)).await?;
        Ok(())
    }

    async fn review_file(
        &self,
        mission_id: DbId,
        file_id: DbId,
        action: ReviewAction,
    ) -> Result<(), GatewayError> {
        let url = self.file_url(mission_id, file_id, "/review");
        self.send(self.client.post(url).query(&[("action", action.as_str())]))
            .await?;
        Ok(())
    }

    async fn annotate_file(
        &self,
        mission_id: DbId,
        file_id: DbId,
        label: &str,
        notes: &str,
    ) -> Result<(), GatewayError> {
        let url = self.file_url(mission_id, file_id, "/annotate");
        self.send(
            self.client
                .post(url)
                .query(&[("label", label), ("notes", notes)]),
        )
        .await?;
        Ok(())
    }

    async fn save_responses(
        &self,
        mission_id: DbId,
        file_id: DbId,
        set: &AnnotationResponseSet,
    ) -> Result<(), GatewayError> {
        let url = self.file_url(mission_id, file_id, "/responses");
        self.send(self.client.put(url).json(set)).await?;
        Ok(())
    }

    async fn join_mission(&self, mission_id: DbId) -> Result<(), GatewayError> {
        let url = self.mission_url(mission_id, "/join");
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    async fn upload_files(
        &self,
        mission_id: DbId,
        dataset_id: DbId,
        files: Vec<UploadFile>,
    ) -> Result<Vec<DataFile>, GatewayError> {
        let count = files.len();
        let url = self.mission_url(mission_id, &format!("/datasets/{dataset_id}/files"));
        let form = upload_form(files)?;
        let response = self.send(self.client.post(url).multipart(form)).await?;
        let envelope: DataEnvelope<Vec<DataFile>> = Self::parse_response(response).await?;
        tracing::debug!(mission_id, dataset_id, count, "Files uploaded");
        Ok(envelope.data)
    }
}
