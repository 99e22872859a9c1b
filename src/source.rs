//! Template sources: map a template identifier to template text.
//!
//! The variant is chosen once, when the service is built:
//!
//! * [`TemplateSource::Local`] reads `<dir>/<template_id>` from disk on every call.
//! * [`TemplateSource::Remote`] downloads `<prefix>/<template_id>` from object
//!   storage and keeps it in a [`TemplateCache`] for the configured TTL.

use crate::cache::TemplateCache;
use crate::config::{ServiceConfig, TemplateSourceConfig};
use crate::error::{SourceError, Tmpl2PdfError};
use crate::storage::StorageClient;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Template text plus a freshness hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    pub content: String,
    /// `true` when served from a valid cache entry, i.e. unchanged since the
    /// last check. Always `false` for local templates.
    pub up_to_date: bool,
}

/// Where templates come from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Local(LocalTemplates),
    Remote(RemoteTemplates),
}

impl TemplateSource {
    /// Build the source described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, Tmpl2PdfError> {
        match &config.source {
            TemplateSourceConfig::Local { dir } => Ok(TemplateSource::Local(LocalTemplates::new(dir))),
            TemplateSourceConfig::Remote {
                bucket,
                base_url,
                access_token,
                prefix,
            } => {
                let client = StorageClient::new(
                    base_url.clone(),
                    bucket.clone(),
                    access_token.clone(),
                    Duration::from_secs(config.fetch_timeout_secs),
                )
                .map_err(|e| Tmpl2PdfError::InvalidConfig(e.to_string()))?;
                let cache = Arc::new(TemplateCache::new(Duration::from_secs(
                    config.cache_ttl_secs,
                )));
                Ok(TemplateSource::Remote(RemoteTemplates::new(
                    client,
                    prefix.clone(),
                    cache,
                )))
            }
        }
    }

    /// Resolve `template_id` to its text.
    pub async fn resolve(&self, template_id: &str) -> Result<ResolvedTemplate, SourceError> {
        match self {
            TemplateSource::Local(local) => local.resolve(template_id).await,
            TemplateSource::Remote(remote) => remote.resolve(template_id).await,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, TemplateSource::Remote(_))
    }
}

// ── Local ────────────────────────────────────────────────────────────────

/// Templates stored as files under one directory.
#[derive(Debug, Clone)]
pub struct LocalTemplates {
    dir: PathBuf,
}

impl LocalTemplates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Join `template_id` onto the base directory.
    ///
    /// Returns `None` for identifiers that would leave the directory.
    fn path_for(&self, template_id: &str) -> Option<PathBuf> {
        let relative = Path::new(template_id);
        let stays_inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        stays_inside.then(|| self.dir.join(relative))
    }

    pub async fn resolve(&self, template_id: &str) -> Result<ResolvedTemplate, SourceError> {
        let not_found = || SourceError::NotFound {
            template: template_id.to_string(),
            dir: self.dir.clone(),
        };

        let path = self.path_for(template_id).ok_or_else(not_found)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(not_found());
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;
        debug!("Read template {} ({} bytes)", path.display(), content.len());

        Ok(ResolvedTemplate {
            content,
            up_to_date: false,
        })
    }
}

// ── Remote ───────────────────────────────────────────────────────────────

/// Templates stored in a bucket, fronted by a TTL cache.
#[derive(Debug, Clone)]
pub struct RemoteTemplates {
    client: StorageClient,
    prefix: String,
    cache: Arc<TemplateCache>,
}

impl RemoteTemplates {
    pub fn new(client: StorageClient, prefix: impl Into<String>, cache: Arc<TemplateCache>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<TemplateCache> {
        &self.cache
    }

    /// Object name for `template_id`, e.g. `templates/invoice.html`.
    pub fn object_name(&self, template_id: &str) -> String {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            template_id.to_string()
        } else {
            format!("{prefix}/{template_id}")
        }
    }

    pub async fn resolve(&self, template_id: &str) -> Result<ResolvedTemplate, SourceError> {
        if let Some(content) = self.cache.get(template_id) {
            debug!("Cache hit for '{}'", template_id);
            return Ok(ResolvedTemplate {
                content,
                up_to_date: true,
            });
        }

        let content = self
            .client
            .download_text(&self.object_name(template_id))
            .await?;
        self.cache.put(template_id, content.clone());

        Ok(ResolvedTemplate {
            content,
            up_to_date: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.html"), "<p>{{ x }}</p>").unwrap();

        let local = LocalTemplates::new(dir.path());
        let t = local.resolve("a.html").await.unwrap();
        assert_eq!(t.content, "<p>{{ x }}</p>");
        assert!(!t.up_to_date);
    }

    #[tokio::test]
    async fn local_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalTemplates::new(dir.path())
            .resolve("missing.html")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn local_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("letters")).unwrap();
        let err = LocalTemplates::new(dir.path())
            .resolve("letters")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn local_rejects_escaping_identifiers() {
        let root = tempfile::tempdir().unwrap();
        let templates = root.path().join("templates");
        std::fs::create_dir(&templates).unwrap();
        std::fs::write(root.path().join("secret.txt"), "top secret").unwrap();

        let local = LocalTemplates::new(&templates);
        for id in ["../secret.txt", "/etc/passwd"] {
            let err = local.resolve(id).await.unwrap_err();
            assert!(matches!(err, SourceError::NotFound { .. }), "{id}: {err:?}");
        }
    }

    #[tokio::test]
    async fn local_allows_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("letters")).unwrap();
        std::fs::write(dir.path().join("letters/a.html"), "A").unwrap();

        let t = LocalTemplates::new(dir.path())
            .resolve("letters/a.html")
            .await
            .unwrap();
        assert_eq!(t.content, "A");
    }

    #[test]
    fn object_name_uses_prefix() {
        let client = StorageClient::new("http://localhost", "b", None, Duration::from_secs(1)).unwrap();
        let cache = Arc::new(TemplateCache::default());
        let remote = RemoteTemplates::new(client.clone(), "templates/", Arc::clone(&cache));
        assert_eq!(remote.object_name("x.html"), "templates/x.html");
        let bare = RemoteTemplates::new(client, "", cache);
        assert_eq!(bare.object_name("x.html"), "x.html");
    }

    #[tokio::test]
    async fn remote_serves_cache_without_network() {
        // Unroutable base URL: any download attempt would fail.
        let client = StorageClient::new("http://127.0.0.1:9", "b", None, Duration::from_secs(1)).unwrap();
        let cache = Arc::new(TemplateCache::default());
        cache.put("cached.html", "hello");

        let remote = RemoteTemplates::new(client, "templates", cache);
        let t = remote.resolve("cached.html").await.unwrap();
        assert_eq!(t.content, "hello");
        assert!(t.up_to_date);
    }
}
