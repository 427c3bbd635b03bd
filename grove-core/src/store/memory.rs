use std::collections::BTreeMap;

use async_trait::async_trait;
use grove_model::{ContentUnit, FolderNode, MediaRecord};
use tokio::sync::RwLock;

use crate::error::Result;
use crate::store::ports::{ContentStore, FolderStore, MediaRecordStore};

/// Records addressable by an integer primary identity.
pub trait Keyed: Clone + Send + Sync {
    fn key(&self) -> i64;
}

impl Keyed for FolderNode {
    fn key(&self) -> i64 {
        self.id.get()
    }
}

impl Keyed for ContentUnit {
    fn key(&self) -> i64 {
        self.id.get()
    }
}

impl Keyed for MediaRecord {
    fn key(&self) -> i64 {
        self.id.get()
    }
}

/// In-memory repository used in tests and embedded setups. Each batch call
/// applies atomically under one write lock.
#[derive(Debug, Default)]
pub struct MemoryStore<T> {
    rows: RwLock<BTreeMap<i64, T>>,
}

impl<T: Keyed> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    pub async fn get(&self, key: i64) -> Option<T> {
        self.rows.read().await.get(&key).cloned()
    }

    async fn list(&self) -> Vec<T> {
        self.rows.read().await.values().cloned().collect()
    }

    async fn upsert(&self, records: Vec<T>) -> Vec<T> {
        let mut rows = self.rows.write().await;
        for record in &records {
            rows.insert(record.key(), record.clone());
        }
        records
    }

    async fn remove(&self, records: Vec<T>) {
        let mut rows = self.rows.write().await;
        for record in &records {
            rows.remove(&record.key());
        }
    }
}

#[async_trait]
impl FolderStore for MemoryStore<FolderNode> {
    async fn list_all(&self) -> Result<Vec<FolderNode>> {
        Ok(self.list().await)
    }

    async fn save_all(&self, nodes: Vec<FolderNode>) -> Result<Vec<FolderNode>> {
        Ok(self.upsert(nodes).await)
    }

    async fn delete_all(&self, nodes: Vec<FolderNode>) -> Result<()> {
        self.remove(nodes).await;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore<ContentUnit> {
    async fn list_all(&self) -> Result<Vec<ContentUnit>> {
        Ok(self.list().await)
    }

    async fn save_all(&self, units: Vec<ContentUnit>) -> Result<Vec<ContentUnit>> {
        Ok(self.upsert(units).await)
    }

    async fn delete_all(&self, units: Vec<ContentUnit>) -> Result<()> {
        self.remove(units).await;
        Ok(())
    }
}

#[async_trait]
impl MediaRecordStore for MemoryStore<MediaRecord> {
    async fn list_all(&self) -> Result<Vec<MediaRecord>> {
        Ok(self.list().await)
    }

    async fn save_all(&self, records: Vec<MediaRecord>) -> Result<Vec<MediaRecord>> {
        Ok(self.upsert(records).await)
    }

    async fn delete_all(&self, records: Vec<MediaRecord>) -> Result<()> {
        self.remove(records).await;
        Ok(())
    }
}
