// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Retrieval of the current RPT log of a game server.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Target;
use crate::error::{FetchStep, TransportError};
use crate::http_utils::status_and_body;

/// Suffix convention of the server's diagnostic log files.
pub const RPT_SUFFIX: &str = ".RPT";

/// The current log file of a target and its full content.
#[derive(Debug, Clone)]
pub struct LogSnapshot {
    pub identity: String,
    pub content: Bytes,
}

#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetches the name and content of the log file currently written by `target`.
    async fn fetch_current_log(&self, target: &Target) -> Result<LogSnapshot, TransportError>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct GameserverData {
    gameserver: Gameserver,
}

#[derive(Deserialize)]
struct Gameserver {
    game: String,
    username: String,
    settings: GameserverSettings,
}

#[derive(Deserialize)]
struct GameserverSettings {
    general: GeneralSettings,
}

#[derive(Deserialize)]
struct GeneralSettings {
    #[serde(default)]
    nolog: serde_json::Value,
}

impl GeneralSettings {
    fn logging_disabled(&self) -> bool {
        match &self.nolog {
            serde_json::Value::String(value) => value == "true",
            serde_json::Value::Bool(value) => *value,
            _ => false,
        }
    }
}

#[derive(Deserialize)]
struct FileList {
    entries: Vec<FileEntry>,
}

#[derive(Deserialize)]
struct FileEntry {
    name: String,
}

#[derive(Deserialize)]
struct DownloadLink {
    token: DownloadToken,
}

#[derive(Deserialize)]
struct DownloadToken {
    url: String,
}

#[derive(Serialize)]
struct ListRequest<'a> {
    dir: &'a str,
}

#[derive(Serialize)]
struct DownloadRequest<'a> {
    file: &'a str,
}

/// Reads RPT logs through the Nitrado game server API.
#[derive(Debug, Clone)]
pub struct NitradoLogSource {
    client: reqwest::Client,
    api_url: String,
}

impl NitradoLogSource {
    pub fn new(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    fn gameservers_url(&self, target: &Target) -> String {
        format!("{}/services/{}/gameservers", self.api_url, target.service_id)
    }

    async fn send(
        step: FetchStep,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|source| TransportError::Request { step, source })?;
        if response.status() != StatusCode::OK {
            let (status, body) = status_and_body(response).await;
            return Err(TransportError::Status { step, status, body });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        step: FetchStep,
        request: RequestBuilder,
    ) -> Result<T, TransportError> {
        let response = Self::send(step, request).await?;
        let envelope: Envelope<T> =
            response
                .json()
                .await
                .map_err(|err| TransportError::Malformed {
                    step,
                    reason: err.to_string(),
                })?;
        Ok(envelope.data)
    }

    /// Name of the newest log file in `dir`. Names embed a sortable timestamp.
    async fn current_log_name(&self, target: &Target, dir: &str) -> Result<String, TransportError> {
        let request = self
            .client
            .get(format!("{}/file_server/list", self.gameservers_url(target)))
            .bearer_auth(&target.access_token)
            .json(&ListRequest { dir });
        let list: FileList = Self::get_json(FetchStep::FileList, request).await?;

        list.entries
            .into_iter()
            .map(|entry| entry.name)
            .filter(|name| name.contains(RPT_SUFFIX))
            .max()
            .ok_or_else(|| TransportError::NoLogFile {
                dir: dir.to_string(),
            })
    }
}

#[async_trait]
impl LogSource for NitradoLogSource {
    async fn fetch_current_log(&self, target: &Target) -> Result<LogSnapshot, TransportError> {
        let request = self
            .client
            .get(self.gameservers_url(target))
            .bearer_auth(&target.access_token);
        let info: GameserverData = Self::get_json(FetchStep::ServiceInfo, request).await?;
        let gameserver = info.gameserver;
        if gameserver.settings.general.logging_disabled() {
            return Err(TransportError::LoggingDisabled);
        }

        let dir = format!(
            "/games/{}/noftp/{}/config",
            gameserver.username, gameserver.game
        );
        let identity = self.current_log_name(target, &dir).await?;
        debug!(
            "Service {}: current log file is {identity}",
            target.service_id
        );

        let file = format!("{dir}/{identity}");
        let request = self
            .client
            .get(format!("{}/file_server/download", self.gameservers_url(target)))
            .bearer_auth(&target.access_token)
            .json(&DownloadRequest { file: &file });
        let link: DownloadLink = Self::get_json(FetchStep::DownloadLink, request).await?;

        let response = Self::send(FetchStep::Download, self.client.get(&link.token.url)).await?;
        let content = response
            .bytes()
            .await
            .map_err(|source| TransportError::Request {
                step: FetchStep::Download,
                source,
            })?;
        debug!(
            "Service {}: downloaded {} bytes of {identity}",
            target.service_id,
            content.len()
        );

        Ok(LogSnapshot { identity, content })
    }
}
