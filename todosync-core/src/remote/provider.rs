//! Provider subprocess transport.
//!
//! A provider is any executable named `todosync-provider-<name>` on `PATH`
//! that reads one JSON request from stdin and writes one JSON response to
//! stdout. Providers own their credentials; todosync only forwards the
//! provider-specific keys of the `[remote]` config table.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use crate::error::{SyncError, SyncResult};
use crate::event::{Event, EventPatch};
use crate::remote::RemoteCalendar;
use crate::remote::protocol::{
    Command, DeleteEvent, InsertEvent, ListEvents, PatchEvent, ProviderCommand, Request, Response,
};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider(String);

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider(name.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn binary_name(&self) -> String {
        format!("todosync-provider-{}", self.0)
    }

    fn binary_path(&self) -> SyncResult<std::path::PathBuf> {
        which::which(self.binary_name())
            .map_err(|_| SyncError::ProviderNotInstalled(self.binary_name()))
    }

    /// Fail early when the provider binary is missing.
    pub fn ensure_installed(&self) -> SyncResult<()> {
        self.binary_path().map(|_| ())
    }

    /// Call a typed provider command, bounded by the provider timeout.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> SyncResult<C::Response> {
        timeout(PROVIDER_TIMEOUT, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| SyncError::ProviderTimeout(PROVIDER_TIMEOUT.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> SyncResult<R> {
        let params =
            serde_json::to_value(params).map_err(|e| SyncError::Serialization(e.to_string()))?;
        let request_json = serde_json::to_string(&Request { command, params })
            .map_err(|e| SyncError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;

        let mut child = TokioCommand::new(&binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SyncError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SyncError::Provider("Provider stdin unavailable".into()))?;
        stdin.write_all(format!("{request_json}\n").as_bytes()).await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(SyncError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_response<R: serde::de::DeserializeOwned>(raw: &str) -> SyncResult<R> {
    if raw.trim().is_empty() {
        return Err(SyncError::Provider("Provider returned no response".into()));
    }

    let response: Response<R> = serde_json::from_str(raw)
        .map_err(|e| SyncError::Provider(format!("Failed to parse response: {}", e)))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(SyncError::Provider(error)),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RemoteConfig(pub HashMap<String, toml::Value>);

impl From<&RemoteConfig> for serde_json::Map<String, serde_json::Value> {
    fn from(config: &RemoteConfig) -> Self {
        config
            .0
            .iter()
            .filter_map(|(k, v)| serde_json::to_value(v).ok().map(|v| (k.clone(), v)))
            .collect()
    }
}

/// The `[remote]` config table: a provider plus its own settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderRemote {
    pub provider: Provider,
    #[serde(flatten)]
    pub config: RemoteConfig,
}

impl ProviderRemote {
    pub fn new(provider: Provider, config: RemoteConfig) -> Self {
        ProviderRemote { provider, config }
    }

    fn remote_config(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::from(&self.config)
    }
}

#[async_trait]
impl RemoteCalendar for ProviderRemote {
    async fn list_events(
        &self,
        from: DateTime<FixedOffset>,
        max_results: u32,
    ) -> SyncResult<Vec<Event>> {
        self.provider
            .call(ListEvents {
                remote_config: self.remote_config(),
                from: from.to_rfc3339(),
                max_results,
            })
            .await
    }

    async fn insert_event(&self, event: &Event) -> SyncResult<Event> {
        self.provider
            .call(InsertEvent {
                remote_config: self.remote_config(),
                event: event.clone(),
            })
            .await
    }

    async fn patch_event(&self, event_id: &str, patch: &EventPatch) -> SyncResult<()> {
        self.provider
            .call(PatchEvent {
                remote_config: self.remote_config(),
                event_id: event_id.to_string(),
                patch: patch.clone(),
            })
            .await
    }

    async fn delete_event(&self, event_id: &str) -> SyncResult<()> {
        self.provider
            .call(DeleteEvent {
                remote_config: self.remote_config(),
                event_id: event_id.to_string(),
            })
            .await
    }
}
