//! Recipe data model shared by the resolvers and the protocol adapters
//!
//! - [`RecipeCoordinates`] identify a recipe by `name/version@user/channel`
//! - [`Revision`] is the current-revision pointer read from the content store
//! - [`FileManifest`] is the canonical file listing of one revision
//!
//! Every value here is parsed from request path segments or store documents
//! and is immutable afterwards. Segment validation lives in [`coordinates`].

pub mod coordinates;
pub mod manifest;

pub use coordinates::{
    CoordinateError, RecipeCoordinates, UNSCOPED, validate_filename, validate_revision,
};
pub use manifest::{
    EXPORT_ARCHIVE, FileEntry, FileListing, FileManifest, RECIPE_MANIFEST, RECIPE_SCRIPT,
    WELL_KNOWN_FILES,
};

use serde::{Deserialize, Serialize};

/// Current-revision pointer document (`latest.json`)
///
/// ```json
/// { "revision": "4fb6e3981f4b64ebe13aa667d4fc1284", "time": "2020-10-20T03:02:46.710+0000" }
/// ```
///
/// `time` is kept verbatim; the store's format is not RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub revision: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_pointer_parses_with_and_without_time() {
        let with_time: Revision = serde_json::from_str(
            r#"{"revision": "abc123", "time": "2020-10-20T03:02:46.710+0000"}"#,
        )
        .unwrap();
        assert_eq!(with_time.revision, "abc123");
        assert_eq!(with_time.time.as_deref(), Some("2020-10-20T03:02:46.710+0000"));

        let bare: Revision = serde_json::from_str(r#"{"revision": "abc123"}"#).unwrap();
        assert!(bare.time.is_none());
        assert_eq!(serde_json::to_string(&bare).unwrap(), r#"{"revision":"abc123"}"#);
    }
}
