pub mod policy;
pub mod reactions;
pub mod recall;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use lantern_types::models::Message;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to persist channel log: {0}")]
    Persistence(#[source] std::io::Error),
    #[error("failed to encode channel log: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Durable, append-oriented log of messages, one JSON document per channel
/// at `{dir}/{channel_id}.json`.
///
/// Every mutation rewrites the channel's whole log. That is a deliberate
/// simplicity/throughput trade-off for low channel volumes; the per-channel
/// lock makes each read-modify-write cycle single-writer, so overlapping
/// reactions or recalls on one channel cannot lose updates. Channels never
/// block each other.
pub struct ChannelStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChannelStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(StoreError::Persistence)?;
        info!("Channel logs directory: {}", dir.display());
        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    fn log_path(&self, channel_id: &str) -> PathBuf {
        self.dir.join(format!("{channel_id}.json"))
    }

    async fn lock_for(&self, channel_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .clone()
    }

    /// Full ordered log of a channel. A missing or corrupt log reads as
    /// empty; history fetches never fail.
    pub async fn read_all(&self, channel_id: &str) -> Vec<Message> {
        let path = self.log_path(channel_id);
        let raw = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Unreadable log for channel {}: {}", channel_id, e);
                return Vec::new();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Corrupt log for channel {}: {}", channel_id, e);
                Vec::new()
            }
        }
    }

    /// Raw serialized log text, if the channel has one.
    pub async fn read_raw(&self, channel_id: &str) -> Option<String> {
        tokio::fs::read_to_string(self.log_path(channel_id)).await.ok()
    }

    /// Append one message to a channel's log. The log is persisted before
    /// this returns; on failure the caller must not broadcast.
    pub async fn append(&self, channel_id: &str, message: Message) -> Result<Message, StoreError> {
        let lock = self.lock_for(channel_id).await;
        let _guard = lock.lock().await;

        let mut log = self.read_all(channel_id).await;
        log.push(message.clone());
        self.write_log(channel_id, &log).await?;
        Ok(message)
    }

    /// Locate a record by `messageId` OR `clientId`: the two ids form one
    /// lookup namespace, `messageId` taking priority within a record.
    pub fn find_index(log: &[Message], key: &str) -> Option<usize> {
        let message_id = key.parse::<Uuid>().ok();
        log.iter().position(|m| {
            message_id.is_some_and(|id| m.message_id == id)
                || m.client_id.as_deref() == Some(key)
        })
    }

    /// Rewrite the record at a known position and re-persist the whole log.
    /// Returns the stored record, or `None` when the index is out of range.
    pub async fn update(
        &self,
        channel_id: &str,
        index: usize,
        record: Message,
    ) -> Result<Option<Message>, StoreError> {
        self.modify(channel_id, |log| {
            let slot = log.get_mut(index)?;
            *slot = record;
            Some(slot.clone())
        })
        .await
    }

    /// One read-modify-write cycle against a channel's log, under that
    /// channel's write lock. `mutate` returns the updated record to hand
    /// back for broadcast, or `None` to leave the log untouched.
    pub(crate) async fn modify<F>(
        &self,
        channel_id: &str,
        mutate: F,
    ) -> Result<Option<Message>, StoreError>
    where
        F: FnOnce(&mut Vec<Message>) -> Option<Message>,
    {
        let lock = self.lock_for(channel_id).await;
        let _guard = lock.lock().await;

        let mut log = self.read_all(channel_id).await;
        let Some(updated) = mutate(&mut log) else {
            return Ok(None);
        };
        self.write_log(channel_id, &log).await?;
        Ok(Some(updated))
    }

    async fn write_log(&self, channel_id: &str, log: &[Message]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(log).map_err(StoreError::Encode)?;
        tokio::fs::write(self.log_path(channel_id), json)
            .await
            .map_err(StoreError::Persistence)
    }
}
