//! Static file serving with single-page-application fallback
//!
//! Any GET/HEAD path that is not a regular file inside the static directory
//! is answered with the shell document, so deep links reach the client
//! router instead of a 404.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, error};

use crate::cache::CriticalAssets;

/// IMF-fixdate, the only date format emitted.
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// What a successful response carried. Inserted into response extensions
/// for the cache-control middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedKind {
    /// A real file from the bundle.
    Asset,
    /// The shell document, requested directly or as fallback.
    Shell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Regular file; `rel` is the slash-separated path under the root.
    File { path: PathBuf, rel: String },
    /// Nothing on disk matches; serve the shell.
    Fallback,
    /// Path tries to leave the static directory.
    Forbidden,
}

struct FileEntry {
    content: Bytes,
    modified: SystemTime,
    size: u64,
    mime: String,
}

/// Static file handler
pub struct StaticFiles {
    root: PathBuf,
    fallback_file: String,
    cache: CriticalAssets,
}

impl StaticFiles {
    /// Create a handler for `root` and preload its critical assets.
    pub fn new(root: impl Into<PathBuf>, fallback_file: impl Into<String>) -> Self {
        let root = root.into();
        let fallback_file = fallback_file.into();
        let cache = CriticalAssets::load(&root, &fallback_file);
        Self {
            root,
            fallback_file,
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &CriticalAssets {
        &self.cache
    }

    /// Map a URL path onto the static directory.
    pub fn resolve(&self, url_path: &str) -> Resolved {
        // Not UTF-8 once decoded: cannot name a bundle file, so the client router gets it.
        let Ok(decoded) = urlencoding::decode(url_path) else {
            return Resolved::Fallback;
        };
        let rel = decoded.trim_start_matches('/');
        if rel.is_empty() {
            return Resolved::Fallback;
        }
        if rel.contains('\0') {
            return Resolved::Forbidden;
        }

        let mut parts = Vec::new();
        for component in Path::new(rel).components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Resolved::Forbidden;
                }
            }
        }
        if parts.is_empty() {
            return Resolved::Fallback;
        }

        let candidate = parts.iter().fold(self.root.clone(), |p, part| p.join(part));
        match std::fs::metadata(&candidate) {
            Ok(meta) if meta.is_file() => {
                // Symlinks may still point outside the root.
                let (Ok(canon_root), Ok(canon_req)) = (self.root.canonicalize(), candidate.canonicalize())
                else {
                    return Resolved::Fallback;
                };
                if !canon_req.starts_with(&canon_root) {
                    return Resolved::Forbidden;
                }
                Resolved::File {
                    path: candidate,
                    rel: parts.join("/"),
                }
            }
            _ => Resolved::Fallback,
        }
    }

    /// Serve a request path.
    pub async fn serve(&self, method: &Method, url_path: &str, headers: &HeaderMap) -> Response {
        if method != Method::GET && method != Method::HEAD {
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "GET, HEAD")],
                "Method not allowed",
            )
                .into_response();
        }

        // Critical assets are answered from memory before the disk is consulted.
        let cache_key = if url_path == "/" {
            format!("/{}", self.fallback_file)
        } else {
            url_path.to_string()
        };
        if let Some(cached) = self.cache.get(&cache_key) {
            let kind = if cache_key[1..] == self.fallback_file {
                ServedKind::Shell
            } else {
                ServedKind::Asset
            };
            let entry = FileEntry {
                content: cached.content.clone(),
                modified: cached.modified,
                size: cached.size,
                mime: cached.mime.clone(),
            };
            let mut response = respond(entry, method, headers);
            response.extensions_mut().insert(kind);
            return response;
        }

        let (path, rel) = match self.resolve(url_path) {
            Resolved::Forbidden => return (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            Resolved::File { path, rel } => (path, rel),
            Resolved::Fallback => (self.root.join(&self.fallback_file), self.fallback_file.clone()),
        };
        let kind = if rel == self.fallback_file {
            ServedKind::Shell
        } else {
            ServedKind::Asset
        };

        let entry = match self.cache.get(&format!("/{}", rel)) {
            Some(cached) => FileEntry {
                content: cached.content.clone(),
                modified: cached.modified,
                size: cached.size,
                mime: cached.mime.clone(),
            },
            None => match read_entry(&path).await {
                Ok(entry) => entry,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("{} not found (requested {})", path.display(), url_path);
                    return (StatusCode::NOT_FOUND, "Not found").into_response();
                }
                Err(e) => {
                    error!("Failed to read {}: {}", path.display(), e);
                    return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response();
                }
            },
        };

        let mut response = respond(entry, method, headers);
        response.extensions_mut().insert(kind);
        response
    }
}

async fn read_entry(path: &Path) -> std::io::Result<FileEntry> {
    let meta = tokio::fs::metadata(path).await?;
    let content = tokio::fs::read(path).await?;
    Ok(FileEntry {
        size: meta.len(),
        modified: meta.modified()?,
        content: Bytes::from(content),
        mime: content_type_for(path),
    })
}

fn respond(entry: FileEntry, method: &Method, headers: &HeaderMap) -> Response {
    let etag = entity_tag(entry.modified, entry.size);
    let last_modified = http_date(entry.modified);

    if is_not_modified(headers, &etag, entry.modified) {
        return (
            StatusCode::NOT_MODIFIED,
            [(header::ETAG, etag), (header::LAST_MODIFIED, last_modified)],
        )
            .into_response();
    }

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, entry.mime),
            (header::ETAG, etag),
            (header::LAST_MODIFIED, last_modified),
        ],
    )
        .into_response();

    if method == Method::HEAD {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(entry.size));
    } else {
        *response.body_mut() = Body::from(entry.content);
    }
    response
}

/// `"<mtime secs hex>-<size hex>"`
pub fn entity_tag(modified: SystemTime, size: u64) -> String {
    let secs = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("\"{:x}-{:x}\"", secs, size)
}

pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), HTTP_DATE_FORMAT).ok()?;
    Some(SystemTime::from(Utc.from_utc_datetime(&naive)))
}

/// Conditional GET. `If-None-Match` takes precedence; `If-Modified-Since`
/// is only consulted when it is absent, with one second of slack because
/// HTTP dates drop sub-second precision.
pub fn is_not_modified(headers: &HeaderMap, etag: &str, modified: SystemTime) -> bool {
    if let Some(value) = headers.get(header::IF_NONE_MATCH) {
        let Ok(value) = value.to_str() else {
            return false;
        };
        return value.split(',').map(str::trim).any(|candidate| {
            candidate == "*" || candidate == etag || candidate.strip_prefix("W/") == Some(etag)
        });
    }

    headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
        .map(|since| modified < since + Duration::from_secs(1))
        .unwrap_or(false)
}

/// Content type from the file extension; HTML gets an explicit charset.
pub fn content_type_for(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.essence_str() == "text/html" {
        "text/html; charset=utf-8".to_string()
    } else {
        mime.to_string()
    }
}
