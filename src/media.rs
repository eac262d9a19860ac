//! Media download helpers: fetch a classified output URL to disk.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use tokio::fs;

use reqwest::Method;

use crate::{
    classify::{classify, url_path, OutputKind},
    client::ClientInner,
    errors::{Error, Result, ValidationError},
    telemetry::RequestContext,
};

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub kind: OutputKind,
    pub bytes_written: u64,
}

#[derive(Clone)]
pub struct MediaClient {
    inner: Arc<ClientInner>,
}

impl MediaClient {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Download a media URL into `dir` under a sanitized `base_name`.
    ///
    /// The file extension comes from the URL path when present, otherwise
    /// from the classified kind's default. The directory is created when
    /// missing. Media hosts are third-party storage, so no Authorization
    /// header is sent.
    pub async fn download(&self, url: &str, dir: &Path, base_name: &str) -> Result<Download> {
        if !url.starts_with("http") {
            return Err(ValidationError::new("media url must be http(s)")
                .with_field("url")
                .into());
        }

        let kind = classify(url);
        let extension = extension_from_url(url)
            .unwrap_or_else(|| kind.default_extension().to_string());
        let file_name = format!("{}.{extension}", sanitize_file_name(base_name));

        let builder = self
            .inner
            .with_headers(self.inner.request(Method::GET, url)?, false)
            .timeout(self.inner.request_timeout);
        let ctx = RequestContext::new("GET", url_path(url));

        let resp = self.inner.send(builder, ctx).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| self.inner.to_transport_error(err))?;

        fs::create_dir_all(dir)
            .await
            .map_err(|err| Error::Config(format!("cannot create {}: {err}", dir.display())))?;
        let path = dir.join(file_name);
        fs::write(&path, &bytes)
            .await
            .map_err(|err| Error::Config(format!("cannot write {}: {err}", path.display())))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "media downloaded");

        Ok(Download {
            path,
            kind,
            bytes_written: bytes.len() as u64,
        })
    }
}

/// File extension from the URL path, if its last segment carries one.
fn extension_from_url(url: &str) -> Option<String> {
    let path = url_path(url);
    let segment = path.rsplit('/').next()?;
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Sanitize a name for safe filesystem use: anything outside
/// `[A-Za-z0-9._-]` becomes `_`, runs collapse, ends are trimmed, and the
/// result is capped at 100 characters (preserving a final extension).
pub fn sanitize_file_name(name: &str) -> String {
    if name.is_empty() {
        return "unnamed_file".to_string();
    }

    let mut sanitized = String::with_capacity(name.len());
    let mut last_was_underscore = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') {
            sanitized.push(c);
            last_was_underscore = false;
        } else if !last_was_underscore {
            sanitized.push('_');
            last_was_underscore = true;
        }
    }

    let sanitized = sanitized.trim_matches(|c| c == '_' || c == '.').to_string();
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    if sanitized.len() > 100 {
        if let Some((stem, ext)) = sanitized.rsplit_once('.') {
            let stem: String = stem.chars().take(95).collect();
            return format!("{stem}.{ext}");
        }
        return sanitized.chars().take(100).collect();
    }
    sanitized
}
