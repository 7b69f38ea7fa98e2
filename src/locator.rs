use crate::error::SignError;
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    /// Matches `<account>.<service>.core.windows.net` storage hosts.
    static ref STORAGE_HOST: Regex =
        Regex::new(r"^([^.]+)\.(blob|file|queue|table)\.core\.windows\.net$").unwrap();
}

/// Azure storage service named by the second host label.
///
/// The service token is captured for display but does not change how the
/// target is signed: every locator is signed as a blob resource, matching
/// the long-standing behavior of the command this tool replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageService {
    Blob,
    File,
    Queue,
    Table,
}

impl StorageService {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "blob" => Some(StorageService::Blob),
            "file" => Some(StorageService::File),
            "queue" => Some(StorageService::Queue),
            "table" => Some(StorageService::Table),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageService::Blob => "blob",
            StorageService::File => "file",
            StorageService::Queue => "queue",
            StorageService::Table => "table",
        }
    }
}

/// The (account, container, blob) triple identifying a blob resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobLocator {
    pub account: String,
    pub service: StorageService,
    pub container: String,
    /// Remainder of the path after the container segment. May contain
    /// slashes; may be empty for URIs with a trailing slash.
    pub blob: String,
}

/// Parse a selected string into its URL and the locator extracted from it.
///
/// The URL parse failing is a `SignError::Parse`; a well-formed URL that is
/// not shaped like an Azure storage blob URI is a `SignError::Locator`.
pub fn parse_blob_url(input: &str) -> Result<(Url, BlobLocator)> {
    let url = Url::parse(input.trim()).map_err(SignError::from)?;
    let locator = locator_from_url(&url)?;
    Ok((url, locator))
}

/// Apply the two extraction rules to an already-parsed URL.
pub fn locator_from_url(url: &Url) -> Result<BlobLocator, SignError> {
    let host = url.host_str().ok_or_else(SignError::locator)?;
    let caps = STORAGE_HOST.captures(host).ok_or_else(SignError::locator)?;

    let account = caps[1].to_string();
    let service = StorageService::from_token(&caps[2]).ok_or_else(SignError::locator)?;

    let mut segments = url.path_segments().ok_or_else(SignError::locator)?;
    let container = match segments.next() {
        Some(first) if !first.is_empty() => first.to_string(),
        _ => return Err(SignError::locator()),
    };

    // The path must have a second segment; "/container" and "/" are
    // rejected, while "/container/" yields an empty blob name.
    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        return Err(SignError::locator());
    }
    let blob = rest.join("/");

    Ok(BlobLocator {
        account,
        service,
        container,
        blob,
    })
}
