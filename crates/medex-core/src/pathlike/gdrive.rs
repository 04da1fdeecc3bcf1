//! Google Drive tree backend
//!
//! Wraps the Drive v3 `files` API behind [`PathLike`]. The constructor
//! resolves a user-supplied locator (folder link, bare id, or display
//! name) to a single root folder; listing follows `nextPageToken`
//! pagination transparently and retries transient failures with bounded
//! exponential backoff.

use std::fmt;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{PathEntry, PathLike, PathLikeError};

const API_BASE: &str = "https://www.googleapis.com/drive/v3";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const PAGE_SIZE: &str = "1000";
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType)";

/// Maximum attempts per request before surfacing a backend error
const MAX_RETRY_ATTEMPTS: u32 = 3;
/// Backoff base delay; doubled on each retry
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for the Drive backend, passed in explicitly
#[derive(Debug, Clone)]
pub struct GDriveConfig {
    pub api_key: String,
    pub timeout_seconds: u64,
}

impl GDriveConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        GDriveConfig {
            api_key: api_key.into(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// A single HTTP failure, before retry policy is applied
#[derive(Debug)]
pub(crate) enum HttpFailure {
    Status(u16, String),
    Transport(String),
}

impl HttpFailure {
    fn is_transient(&self) -> bool {
        match self {
            HttpFailure::Transport(_) => true,
            // 403 covers Drive's rate-limit responses; 429/5xx are standard
            HttpFailure::Status(code, _) => *code == 403 || *code == 429 || *code >= 500,
        }
    }

    fn into_backend_error(self) -> PathLikeError {
        let reason = match self {
            HttpFailure::Status(code, body) if body.is_empty() => format!("HTTP {}", code),
            HttpFailure::Status(code, body) => format!("HTTP {}: {}", code, body),
            HttpFailure::Transport(reason) => reason,
        };
        PathLikeError::Backend { reason }
    }
}

/// Transport seam: one GET against the Drive API, JSON response
pub(crate) trait DriveHttp {
    fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, HttpFailure>;
}

struct UreqHttp {
    agent: ureq::Agent,
    api_key: String,
}

impl DriveHttp for UreqHttp {
    fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<serde_json::Value, HttpFailure> {
        let url = format!("{}{}", API_BASE, path);
        let mut request = self.agent.get(&url).query("key", &self.api_key);
        for (name, value) in query {
            request = request.query(name, value);
        }
        match request.call() {
            Ok(response) => response
                .into_json()
                .map_err(|e| HttpFailure::Transport(e.to_string())),
            Err(ureq::Error::Status(code, response)) => Err(HttpFailure::Status(
                code,
                response.into_string().unwrap_or_default(),
            )),
            Err(ureq::Error::Transport(transport)) => {
                Err(HttpFailure::Transport(transport.to_string()))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    name: String,
    mime_type: String,
}

impl DriveFile {
    fn into_entry(self) -> PathEntry {
        let is_container = self.mime_type == FOLDER_MIME;
        PathEntry {
            id: self.id,
            name: self.name,
            is_container,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// A resolved Google Drive folder tree
pub struct GDriveRoot {
    http: Box<dyn DriveHttp>,
    root: PathEntry,
}

impl fmt::Debug for GDriveRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // the transport is opaque; the resolved root is what matters
        f.debug_struct("GDriveRoot")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GDriveRoot {
    /// Resolve `locator` to a root folder
    ///
    /// Fails with `RootNotFound` when nothing matches, `AmbiguousRoot`
    /// when a display name matches more than one folder, and `Backend`
    /// for transport/auth/quota failures after retries are exhausted.
    #[tracing::instrument(skip(config))]
    pub fn new(config: GDriveConfig, locator: &str) -> Result<Self, PathLikeError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build();
        let http = Box::new(UreqHttp {
            agent,
            api_key: config.api_key,
        });
        Self::with_http(http, locator)
    }

    pub(crate) fn with_http(
        http: Box<dyn DriveHttp>,
        locator: &str,
    ) -> Result<Self, PathLikeError> {
        let root = match folder_id_from_locator(locator) {
            Some(id) => lookup_folder(http.as_ref(), &id, locator)?,
            None => search_folder_by_name(http.as_ref(), locator)?,
        };
        debug!(root = %root.name, "resolved drive root");
        Ok(GDriveRoot { http, root })
    }
}

impl PathLike for GDriveRoot {
    fn root(&self) -> &PathEntry {
        &self.root
    }

    fn children(&self, entry: &PathEntry) -> Result<Vec<PathEntry>, PathLikeError> {
        if !entry.is_container {
            return Ok(Vec::new());
        }
        let query = format!("'{}' in parents and trashed = false", entry.id);
        let mut entries = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut params = vec![
                ("q", query.as_str()),
                ("fields", LIST_FIELDS),
                ("pageSize", PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let value = request_with_retry(self.http.as_ref(), "/files", &params)
                .map_err(HttpFailure::into_backend_error)?;
            let page: FileList = serde_json::from_value(value).map_err(|e| {
                PathLikeError::Backend {
                    reason: format!("malformed file list: {}", e),
                }
            })?;
            entries.extend(page.files.into_iter().map(DriveFile::into_entry));
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(entries)
    }
}

/// Extract a folder id from link-shaped locators; `None` means the
/// locator should be treated as a display name.
fn folder_id_from_locator(locator: &str) -> Option<String> {
    let locator = locator.trim();
    if let Some((_, rest)) = locator.split_once("/folders/") {
        return Some(trim_id(rest));
    }
    if let Some((_, rest)) = locator
        .split_once("?id=")
        .or_else(|| locator.split_once("&id="))
    {
        return Some(trim_id(rest));
    }
    if looks_like_drive_id(locator) {
        return Some(locator.to_string());
    }
    None
}

fn trim_id(s: &str) -> String {
    s.split(['?', '&', '/', '#'])
        .next()
        .unwrap_or_default()
        .to_string()
}

fn looks_like_drive_id(s: &str) -> bool {
    s.len() >= 20
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn lookup_folder(
    http: &dyn DriveHttp,
    id: &str,
    locator: &str,
) -> Result<PathEntry, PathLikeError> {
    let path = format!("/files/{}", id);
    let value = match request_with_retry(http, &path, &[("fields", "id,name,mimeType")]) {
        Ok(value) => value,
        Err(HttpFailure::Status(404, _)) => {
            return Err(PathLikeError::RootNotFound {
                locator: locator.to_string(),
            })
        }
        Err(failure) => return Err(failure.into_backend_error()),
    };
    let file: DriveFile = serde_json::from_value(value).map_err(|e| PathLikeError::Backend {
        reason: format!("malformed file resource: {}", e),
    })?;
    let entry = file.into_entry();
    if !entry.is_container {
        return Err(PathLikeError::RootNotFound {
            locator: locator.to_string(),
        });
    }
    Ok(entry)
}

fn search_folder_by_name(http: &dyn DriveHttp, name: &str) -> Result<PathEntry, PathLikeError> {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    let query = format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, FOLDER_MIME
    );
    let mut matches: Vec<DriveFile> = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
        let mut params = vec![
            ("q", query.as_str()),
            ("fields", LIST_FIELDS),
            ("pageSize", PAGE_SIZE),
        ];
        if let Some(token) = page_token.as_deref() {
            params.push(("pageToken", token));
        }
        let value = request_with_retry(http, "/files", &params)
            .map_err(HttpFailure::into_backend_error)?;
        let list: FileList = serde_json::from_value(value).map_err(|e| PathLikeError::Backend {
            reason: format!("malformed file list: {}", e),
        })?;
        matches.extend(list.files);
        // a second match is enough to settle ambiguity
        if matches.len() > 1 {
            return Err(PathLikeError::AmbiguousRoot {
                locator: name.to_string(),
                count: matches.len(),
            });
        }
        match list.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }
    match matches.pop() {
        Some(file) => Ok(file.into_entry()),
        None => Err(PathLikeError::RootNotFound {
            locator: name.to_string(),
        }),
    }
}

fn request_with_retry(
    http: &dyn DriveHttp,
    path: &str,
    query: &[(&str, &str)],
) -> Result<serde_json::Value, HttpFailure> {
    let mut attempt = 0;
    let mut delay = RETRY_BASE_DELAY;
    loop {
        attempt += 1;
        match http.get_json(path, query) {
            Ok(value) => return Ok(value),
            Err(failure) if failure.is_transient() && attempt < MAX_RETRY_ATTEMPTS => {
                warn!(path, attempt, ?delay, "transient drive failure, retrying");
                thread::sleep(delay);
                delay *= 2;
            }
            Err(failure) => return Err(failure),
        }
    }
}
