//! Dataset providers.
//!
//! A provider resolves a (dataset, data file) pair to a readable local path.
//! The local provider serves pre-downloaded files; the HTTP provider streams
//! the file into a cache directory on first use.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

#[async_trait]
pub trait DatasetProvider: Send + Sync {
    /// Resolve the data file to a local path, fetching it if necessary.
    async fn fetch(&self, dataset: &str, data_file: &str) -> Result<PathBuf>;
}

/// Serves data files from a local directory tree.
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DatasetProvider for LocalProvider {
    async fn fetch(&self, dataset: &str, data_file: &str) -> Result<PathBuf> {
        // Accept both <root>/<dataset>/<file> and a flat <root>/<file>.
        let candidates = [self.root.join(dataset).join(data_file), self.root.join(data_file)];
        for path in &candidates {
            if path.is_file() {
                tracing::info!(path = %path.display(), "using local data file");
                return Ok(path.clone());
            }
        }
        Err(Error::Provider(format!(
            "data file {data_file} for dataset {dataset} not found under {}",
            self.root.display()
        )))
    }
}

/// Downloads data files over HTTP, caching them under a local directory.
pub struct HttpProvider {
    client: reqwest::Client,
    base_url: String,
    cache_dir: PathBuf,
}

impl HttpProvider {
    pub fn new(base_url: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            cache_dir: cache_dir.into(),
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("request to {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "download of {url} returned status {}",
                response.status()
            )));
        }

        // Stream into a partial file, then rename so the cache never holds a
        // truncated download.
        let partial = dest.with_extension("part");
        let mut out = tokio::fs::File::create(&partial).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes =
                chunk.map_err(|e| Error::Provider(format!("download of {url} aborted: {e}")))?;
            out.write_all(&bytes).await?;
        }
        out.flush().await?;
        drop(out);
        tokio::fs::rename(&partial, dest).await?;
        Ok(())
    }
}

#[async_trait]
impl DatasetProvider for HttpProvider {
    async fn fetch(&self, dataset: &str, data_file: &str) -> Result<PathBuf> {
        let dest = self.cache_dir.join(dataset).join(data_file);
        if dest.is_file() {
            tracing::info!(path = %dest.display(), "using cached data file");
            return Ok(dest);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let url = format!(
            "{}/{dataset}/{data_file}",
            self.base_url.trim_end_matches('/')
        );
        tracing::info!(url, path = %dest.display(), "downloading data file");
        self.download(&url, &dest).await?;
        Ok(dest)
    }
}
