//! Storage locations (S3, GCS, Azure, local filesystem, memory)

use super::glob::GlobPattern;
use crate::config::StorageCredentials;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// An object store plus a key prefix inside it
#[derive(Debug, Clone)]
pub struct StorageLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Key prefix within the bucket/container/directory
    prefix: ObjectPath,
    /// URL scheme for logging (s3, gs, az, file, memory)
    scheme: String,
    /// Human-readable root, e.g. `s3://bucket`
    root: String,
}

impl StorageLocation {
    /// Parse a location URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` or `s3a://bucket/path/` - AWS S3 and S3-compatible stores
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `file:///local/path/`, `/local/path/` or `./path/` - Local filesystem
    ///
    /// Local directories are created when `create_local` is set; otherwise
    /// they must already exist.
    pub fn parse(
        location: &str,
        credentials: &StorageCredentials,
        create_local: bool,
    ) -> Result<Self> {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "s3" | "s3a") => Self::parse_s3(&url, credentials),
            Ok(url) if url.scheme() == "gs" => Self::parse_gcs(&url),
            Ok(url) if url.scheme() == "az" => Self::parse_azure(&url),
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| Error::location(location, "not a valid file URL"))?;
                Self::local(path, create_local)
            }
            // Anything else that parses as a URL with a scheme longer than a
            // drive letter is a typo, not a path
            Ok(url) if url.scheme().len() > 1 => Err(Error::location(
                location,
                format!("unsupported scheme '{}'", url.scheme()),
            )),
            _ => Self::local(location, create_local),
        }
    }

    /// Local directory location
    pub fn local(path: impl AsRef<std::path::Path>, create: bool) -> Result<Self> {
        let path = path.as_ref();
        let display = path.display().to_string();

        if create {
            std::fs::create_dir_all(path).map_err(|e| {
                Error::location(&display, format!("failed to create directory: {e}"))
            })?;
        } else if !path.is_dir() {
            return Err(Error::location(&display, "directory does not exist"));
        }

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::location(&display, format!("failed to open: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: ObjectPath::default(),
            scheme: "file".to_string(),
            root: display.trim_end_matches('/').to_string(),
        })
    }

    /// Process-local in-memory location
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(InMemory::new()), "memory")
    }

    /// Wrap an existing object store, rooted at its top level
    pub fn with_store(store: Arc<dyn ObjectStore>, scheme: impl Into<String>) -> Self {
        let scheme = scheme.into();
        Self {
            store,
            prefix: ObjectPath::default(),
            root: format!("{scheme}:/"),
            scheme,
        }
    }

    fn parse_s3(url: &Url, credentials: &StorageCredentials) -> Result<Self> {
        let bucket = bucket_of(url)?;
        let credentials = credentials.non_empty();

        let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
        if let Some(key) = &credentials.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(secret) = &credentials.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(token) = &credentials.session_token {
            builder = builder.with_token(token);
        }
        if let Some(region) = &credentials.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &credentials.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| Error::location(url.as_str(), format!("failed to create S3 client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: prefix_of(url)?,
            scheme: "s3".to_string(),
            root: format!("s3://{bucket}"),
        })
    }

    fn parse_gcs(url: &Url) -> Result<Self> {
        let bucket = bucket_of(url)?;

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| {
                Error::location(url.as_str(), format!("failed to create GCS client: {e}"))
            })?;

        Ok(Self {
            store: Arc::new(store),
            prefix: prefix_of(url)?,
            scheme: "gs".to_string(),
            root: format!("gs://{bucket}"),
        })
    }

    fn parse_azure(url: &Url) -> Result<Self> {
        let container = bucket_of(url)?;

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| {
                Error::location(url.as_str(), format!("failed to create Azure client: {e}"))
            })?;

        Ok(Self {
            store: Arc::new(store),
            prefix: prefix_of(url)?,
            scheme: "az".to_string(),
            root: format!("az://{container}"),
        })
    }

    /// Location one directory level down, sharing the same store
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self {
            store: Arc::clone(&self.store),
            prefix: self.prefix.child(name),
            scheme: self.scheme.clone(),
            root: self.root.clone(),
        }
    }

    /// Key prefix within the store
    pub fn prefix(&self) -> &ObjectPath {
        &self.prefix
    }

    /// Get the scheme (s3, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Full display form of a key, for logging
    pub fn display(&self, path: &ObjectPath) -> String {
        if path.as_ref().is_empty() {
            self.root.clone()
        } else {
            format!("{}/{path}", self.root)
        }
    }

    /// Key relative to this location's prefix
    pub fn relative<'a>(&self, path: &'a ObjectPath) -> &'a str {
        let key = path.as_ref();
        let prefix = self.prefix.as_ref();
        if prefix.is_empty() {
            return key;
        }
        key.strip_prefix(prefix)
            .map_or(key, |rest| rest.trim_start_matches('/'))
    }

    /// Every object under this location, sorted by key
    pub async fn list(&self) -> Result<Vec<ObjectMeta>> {
        self.list_under(&self.prefix).await
    }

    async fn list_under(&self, prefix: &ObjectPath) -> Result<Vec<ObjectMeta>> {
        let prefix = if prefix.as_ref().is_empty() {
            None
        } else {
            Some(prefix)
        };
        let mut objects: Vec<ObjectMeta> = self.store.list(prefix).try_collect().await?;
        objects.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(objects)
    }

    /// Objects whose key, relative to this location, matches `pattern`
    ///
    /// Results are sorted by key so reads are deterministic.
    pub async fn glob(&self, pattern: &GlobPattern) -> Result<Vec<ObjectMeta>> {
        let mut base = self.prefix.clone();
        for segment in pattern.literal_prefix() {
            base = base.child(segment.as_str());
        }

        let objects = self.list_under(&base).await?;
        let listed = objects.len();
        let matched: Vec<ObjectMeta> = objects
            .into_iter()
            .filter(|meta| pattern.is_match(self.relative(&meta.location)))
            .collect();

        debug!(
            pattern = pattern.pattern(),
            base = %self.display(&base),
            listed,
            matched = matched.len(),
            "Resolved glob"
        );
        Ok(matched)
    }

    /// Read a whole object
    pub async fn get(&self, path: &ObjectPath) -> Result<Bytes> {
        let result = self.store.get(path).await?;
        Ok(result.bytes().await?)
    }

    /// Write bytes to a key relative to this location
    pub async fn put(&self, relative: &ObjectPath, data: Bytes) -> Result<ObjectPath> {
        let mut path = self.prefix.clone();
        for part in relative.parts() {
            path = path.child(part);
        }

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::output(format!("Failed to write {}: {e}", self.display(&path))))?;

        Ok(path)
    }

    /// Delete every object under this location
    ///
    /// Returns the number of objects removed.
    pub async fn delete_all(&self) -> Result<usize> {
        let objects = self.list().await?;
        let mut deleted = 0;
        for meta in objects {
            match self.store.delete(&meta.location).await {
                Ok(()) => deleted += 1,
                Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => {
                    return Err(Error::output(format!(
                        "Failed to delete {}: {e}",
                        self.display(&meta.location)
                    )))
                }
            }
        }
        Ok(deleted)
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display(&self.prefix))
    }
}

fn bucket_of(url: &Url) -> Result<&str> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::location(url.as_str(), "missing bucket name"))
}

fn prefix_of(url: &Url) -> Result<ObjectPath> {
    ObjectPath::from_url_path(url.path())
        .map_err(|e| Error::location(url.as_str(), format!("invalid key prefix: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_s3_url() {
        let creds = StorageCredentials::new("AKIAEXAMPLE", "secret").with_region("us-west-2");
        let location = StorageLocation::parse("s3a://udacity-dend/raw/", &creds, false).unwrap();
        assert_eq!(location.scheme(), "s3");
        assert_eq!(location.prefix().as_ref(), "raw");
        assert_eq!(location.to_string(), "s3://udacity-dend/raw");
    }

    #[test]
    fn test_parse_s3_with_empty_keys() {
        let creds = StorageCredentials::new("", "");
        let location = StorageLocation::parse("s3://lake/star", &creds, false).unwrap();
        assert_eq!(location.to_string(), "s3://lake/star");
    }

    #[test]
    fn test_parse_s3_missing_bucket() {
        let result = StorageLocation::parse("s3:///raw", &StorageCredentials::default(), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_unknown_scheme() {
        let result = StorageLocation::parse("ftp://host/x", &StorageCredentials::default(), false);
        assert!(matches!(result, Err(Error::InvalidLocation { .. })));
    }

    #[test]
    fn test_parse_local_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().to_str().unwrap();
        let location = StorageLocation::parse(path, &StorageCredentials::default(), false).unwrap();
        assert_eq!(location.scheme(), "file");
    }

    #[test]
    fn test_local_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("nope");
        assert!(StorageLocation::local(&missing, false).is_err());
        assert!(StorageLocation::local(&missing, true).is_ok());
        assert!(missing.is_dir());
    }

    #[test]
    fn test_child_and_relative() {
        let location = StorageLocation::in_memory().child("lake");
        let songs = location.child("songs");
        assert_eq!(songs.prefix().as_ref(), "lake/songs");

        let key = ObjectPath::from("lake/songs/year=2000/part-00000.parquet");
        assert_eq!(songs.relative(&key), "year=2000/part-00000.parquet");
    }

    #[tokio::test]
    async fn test_put_glob_delete() {
        let location = StorageLocation::in_memory().child("raw");
        for key in [
            "log_data/2018/11/a.json",
            "log_data/2018/11/b.json",
            "log_data/2018/readme.txt",
            "song_data/A/B/C/s.json",
        ] {
            location
                .put(&ObjectPath::from(key), Bytes::from_static(b"{}"))
                .await
                .unwrap();
        }

        let pattern = GlobPattern::new("log_data/*/*/*.json").unwrap();
        let matched = location.glob(&pattern).await.unwrap();
        let keys: Vec<&str> = matched.iter().map(|m| location.relative(&m.location)).collect();
        assert_eq!(keys, vec!["log_data/2018/11/a.json", "log_data/2018/11/b.json"]);

        let body = location.get(&matched[0].location).await.unwrap();
        assert_eq!(body.as_ref(), b"{}");

        assert_eq!(location.child("log_data").delete_all().await.unwrap(), 3);
        assert_eq!(location.list().await.unwrap().len(), 1);
    }
}
