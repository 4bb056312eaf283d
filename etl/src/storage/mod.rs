use common::{Error, Result};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// A bulk-source location: either `s3://bucket/prefix` or a local path
/// (optionally `file://`). Resolves to a single object or to every object
/// under the prefix, like COPY does.
pub struct SourceLocation {
    store: Arc<dyn ObjectStore>,
    path: ObjectPath,
    location: String,
}

impl SourceLocation {
    pub fn parse(location: &str, region: &str) -> Result<Self> {
        if location.starts_with("s3://") {
            let url = Url::parse(location)?;
            let bucket = url
                .host_str()
                .filter(|bucket| !bucket.is_empty())
                .ok_or_else(|| Error::InvalidInput(format!("missing bucket in {}", location)))?;

            // Credentials come from the standard AWS_* environment variables
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .with_region(region)
                .build()?;
            let path = ObjectPath::from_url_path(url.path())?;

            Ok(Self {
                store: Arc::new(store),
                path,
                location: location.to_string(),
            })
        } else {
            let local = location.strip_prefix("file://").unwrap_or(location);
            let path = ObjectPath::from_filesystem_path(local)?;

            Ok(Self {
                store: Arc::new(LocalFileSystem::new()),
                path,
                location: location.to_string(),
            })
        }
    }

    /// Reads the object at this exact location.
    pub async fn read_object(&self) -> Result<Vec<u8>> {
        let data = self.store.get(&self.path).await?.bytes().await?;
        Ok(data.to_vec())
    }

    /// Reads every object under this location, ordered by key. A location
    /// naming a single object yields just that object.
    pub async fn read_objects(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut objects = match self.store.head(&self.path).await {
            Ok(meta) => vec![meta],
            // a prefix or directory rather than an object
            Err(object_store::Error::NotFound { .. }) => {
                self.store
                    .list(Some(&self.path))
                    .try_collect::<Vec<_>>()
                    .await?
            }
            Err(e) => return Err(e.into()),
        };

        if objects.is_empty() {
            return Err(Error::ObjectStore(format!(
                "no objects found at {}",
                self.location
            )));
        }

        objects.sort_by(|a, b| a.location.cmp(&b.location));
        debug!(location = %self.location, objects = objects.len(), "Listed source objects");

        let mut contents = Vec::with_capacity(objects.len());
        for meta in objects {
            let data = self.store.get(&meta.location).await?.bytes().await?;
            contents.push((meta.location.to_string(), data.to_vec()));
        }

        Ok(contents)
    }
}
