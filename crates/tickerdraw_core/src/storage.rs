use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectStorePath;
use object_store::{ClientOptions, ObjectStore};
use parking_lot::Mutex;
use tickerdraw_error::{DrawError, Result};
use tracing::{debug, info};

/// Resolves the object store backing a bucket.
pub trait StoreProvider: Debug + Send + Sync {
    fn store_for_bucket(&self, bucket: &str) -> object_store::Result<Arc<dyn ObjectStore>>;
}

/// S3 stores configured from the environment.
///
/// Credentials come from the standard `AWS_*` variables, which is what the
/// Lambda runtime provides. Stores are built once per bucket and reused
/// across invocations so connections stay pooled.
#[derive(Debug, Clone)]
pub struct S3StoreProvider {
    region: String,
    timeout: Option<Duration>,
    stores: Arc<Mutex<HashMap<String, Arc<dyn ObjectStore>>>>,
}

impl S3StoreProvider {
    pub fn new(region: impl Into<String>, timeout: Option<Duration>) -> Self {
        S3StoreProvider {
            region: region.into(),
            timeout,
            stores: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn build_store(&self, bucket: &str) -> object_store::Result<Arc<dyn ObjectStore>> {
        let mut options = ClientOptions::new();
        if let Some(timeout) = self.timeout {
            options = options.with_timeout(timeout);
        }

        let store = AmazonS3Builder::from_env()
            .with_region(&self.region)
            .with_bucket_name(bucket)
            .with_client_options(options)
            .build()?;
        debug!(%bucket, region = %self.region, "created s3 store");

        Ok(Arc::new(store))
    }
}

impl StoreProvider for S3StoreProvider {
    fn store_for_bucket(&self, bucket: &str) -> object_store::Result<Arc<dyn ObjectStore>> {
        let mut stores = self.stores.lock();
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store = self.build_store(bucket)?;
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

/// Fixed set of stores keyed by bucket name.
///
/// Unknown buckets are reported as not found.
#[derive(Debug, Clone, Default)]
pub struct StaticStoreProvider {
    buckets: HashMap<String, Arc<dyn ObjectStore>>,
}

impl StaticStoreProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        self.buckets.insert(bucket.into(), store);
        self
    }
}

impl StoreProvider for StaticStoreProvider {
    fn store_for_bucket(&self, bucket: &str) -> object_store::Result<Arc<dyn ObjectStore>> {
        self.buckets
            .get(bucket)
            .cloned()
            .ok_or_else(|| object_store::Error::NotFound {
                path: bucket.to_string(),
                source: format!("Unknown bucket '{bucket}'").into(),
            })
    }
}

/// Download an object fully into memory.
pub async fn fetch_object<S>(stores: &S, bucket: &str, key: &str) -> Result<Bytes>
where
    S: StoreProvider + ?Sized,
{
    let store = stores
        .store_for_bucket(bucket)
        .map_err(|e| DrawError::storage(bucket, key, e))?;

    let location = ObjectStorePath::from(key);
    let bytes = store
        .get(&location)
        .await
        .map_err(|e| DrawError::storage(bucket, key, e))?
        .bytes()
        .await
        .map_err(|e| DrawError::storage(bucket, key, e))?;
    info!(%bucket, %key, size = bytes.len(), "fetched object");

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use object_store::PutPayload;
    use object_store::memory::InMemory;

    use super::*;

    #[tokio::test]
    async fn fetch_existing_object() {
        let store = Arc::new(InMemory::new());
        store
            .put(
                &ObjectStorePath::from("lists/tse.xlsx"),
                PutPayload::from_static(b"hello"),
            )
            .await
            .unwrap();
        let stores = StaticStoreProvider::new().with_bucket("tickers", store);

        let bytes = fetch_object(&stores, "tickers", "lists/tse.xlsx")
            .await
            .unwrap();
        assert_eq!(&b"hello"[..], &bytes[..]);
    }

    #[tokio::test]
    async fn missing_object_is_storage_error() {
        let stores = StaticStoreProvider::new().with_bucket("tickers", Arc::new(InMemory::new()));

        let err = fetch_object(&stores, "tickers", "missing.xlsx")
            .await
            .unwrap_err();
        match err {
            DrawError::Storage { bucket, key, .. } => {
                assert_eq!("tickers", bucket);
                assert_eq!("missing.xlsx", key);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn s3_store_is_reused_per_bucket() {
        let provider = S3StoreProvider::new("ap-northeast-1", Some(Duration::from_secs(5)));

        let first = provider.store_for_bucket("tickers").unwrap();
        let again = provider.store_for_bucket("tickers").unwrap();
        let other = provider.store_for_bucket("archive").unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(Some(Duration::from_secs(5)), provider.timeout());
    }

    #[tokio::test]
    async fn unknown_bucket_is_storage_error() {
        let stores = StaticStoreProvider::new();
        let err = fetch_object(&stores, "nope", "k").await.unwrap_err();
        assert!(matches!(err, DrawError::Storage { .. }), "{err}");
    }
}
