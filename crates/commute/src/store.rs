use async_trait::async_trait;
use bytes::Bytes;
use object_store::{ObjectStore, local::LocalFileSystem, memory::InMemory, path::Path};
use std::sync::Arc;

use crate::errors::StoreError;

/// Durable named byte records provided by the host environment.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;
    async fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// [`KeyValueStore`] over any `object_store` backend. Clones share the backend.
#[derive(Clone, Debug)]
pub struct ObjectKvStore {
    store: Arc<dyn ObjectStore>,
}

impl ObjectKvStore {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// Records live as files under `dir`, which is created if missing.
    pub fn local(dir: impl AsRef<std::path::Path>) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir.as_ref())?;
        let store = LocalFileSystem::new_with_prefix(dir.as_ref())?;
        Ok(Self::new(Arc::new(store)))
    }
}

#[async_trait]
impl KeyValueStore for ObjectKvStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let path = Path::from(key);

        match self.store.get(&path).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        let path = Path::from(key);

        self.store.put(&path, value.into()).await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = Path::from(key);

        match self.store.delete(&path).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
