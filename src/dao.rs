use crate::error::StoreError;
use crate::model::TrackingRecord;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

pub type Records = BTreeMap<String, TrackingRecord>;

/// Persistence seam for tracking records.
///
/// Implementations make no promise about isolation between calls: a handler
/// doing `get` followed by `put` can overwrite a concurrent writer.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, tracking_id: &str) -> Result<Option<TrackingRecord>, StoreError>;

    async fn list(&self) -> Result<Records, StoreError>;

    async fn put(&self, record: TrackingRecord) -> Result<(), StoreError>;

    async fn delete(&self, tracking_id: &str) -> Result<Option<TrackingRecord>, StoreError>;

    /// Linear scan; on a short id collision the first record in key order wins.
    async fn find_by_short_id(&self, short_id: &str) -> Result<Option<TrackingRecord>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_values()
            .find(|record| record.short_id == short_id))
    }
}

/// All records in one JSON object on disk, rewritten whole on every mutation.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !fs::try_exists(&path).await? {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&path, b"{}").await?;
            tracing::info!("Initialized empty record store at {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Records, StoreError> {
        let bytes = fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Readers never see a half-written document, but concurrent savers still
    /// overwrite each other.
    async fn save(&self, records: &Records) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let staging = self
            .path
            .with_extension(format!("{:016x}.tmp", rand::random::<u64>()));
        fs::write(&staging, bytes).await?;
        if let Err(err) = fs::rename(&staging, &self.path).await {
            _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn get(&self, tracking_id: &str) -> Result<Option<TrackingRecord>, StoreError> {
        Ok(self.load().await?.remove(tracking_id))
    }

    async fn list(&self) -> Result<Records, StoreError> {
        self.load().await
    }

    async fn put(&self, record: TrackingRecord) -> Result<(), StoreError> {
        let mut records = self.load().await?;
        records.insert(record.tracking_id.clone(), record);
        self.save(&records).await
    }

    async fn delete(&self, tracking_id: &str) -> Result<Option<TrackingRecord>, StoreError> {
        let mut records = self.load().await?;
        let removed = records.remove(tracking_id);
        if removed.is_some() {
            self.save(&records).await?;
        }
        Ok(removed)
    }
}
