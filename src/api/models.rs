//! Wire payloads shared by the protocol adapters and the listing API
//!
//! Recipe protocol bodies are plain JSON objects keyed by filename, e.g. the
//! V1 snapshot:
//!
//! ```json
//! {
//!   "conan_export.tgz": "feee725dad53a465ab74eda1bfe98e81",
//!   "conanmanifest.txt": "a9bac22e1071021a30b78142a4b4843c",
//!   "conanfile.py": "c8d339a433f888a6217afcaeb744b36a"
//! }
//! ```
//!
//! so they are modelled as ordered maps rather than structs. Everything
//! serializes deterministically: maps are `BTreeMap`, never `HashMap`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct Welcome {
    pub hello: String,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub results: Vec<String>,
}

/// V2 revision file listing
#[derive(Debug, Serialize)]
pub struct RevisionFiles {
    pub files: BTreeMap<String, Map<String, Value>>,
}

/// V1 filename -> md5
pub type Snapshot = BTreeMap<String, String>;

/// V1 filename -> download URL
pub type DownloadUrls = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub ignorecase: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListingMeta {
    pub api_version: &'static str,
    pub server_version: &'static str,
    pub server_name: String,
    pub stability: &'static str,
}
