use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::coordinates::validate_filename;

/// Main content archive; downloads of this file are audited
pub const EXPORT_ARCHIVE: &str = "conan_export.tgz";
pub const RECIPE_MANIFEST: &str = "conanmanifest.txt";
pub const RECIPE_SCRIPT: &str = "conanfile.py";

/// The only files a V1 client knows how to ask for
pub const WELL_KNOWN_FILES: [&str; 3] = [EXPORT_ARCHIVE, RECIPE_MANIFEST, RECIPE_SCRIPT];

/// Per-revision listing document (`files.json`)
///
/// ```json
/// { "files": { "conan_export.tgz": {}, "conanmanifest.txt": {}, "conanfile.py": {} } }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FileListing {
    #[serde(default)]
    pub files: BTreeMap<String, Map<String, Value>>,
}

/// One file of a revision
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileEntry {
    /// Metadata object exactly as the store lists it
    pub metadata: Map<String, Value>,
    /// md5 from `snapshot.json` or the listing's `md5` key
    pub checksum: Option<String>,
}

/// Canonical manifest of a resolved revision
#[derive(Debug, Clone, PartialEq)]
pub struct FileManifest {
    pub revision: String,
    pub files: BTreeMap<String, FileEntry>,
}

impl FileManifest {
    /// Build from the store listing, skipping names that are not plain path segments
    pub fn from_listing(revision: impl Into<String>, listing: FileListing) -> Self {
        let revision = revision.into();
        let files = listing
            .files
            .into_iter()
            .filter_map(|(name, metadata)| {
                if let Err(err) = validate_filename(&name) {
                    warn!(%revision, file = %name, error = %err, "Dropping unsafe manifest entry");
                    return None;
                }
                let checksum = metadata
                    .get("md5")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                Some((name, FileEntry { metadata, checksum }))
            })
            .collect();

        Self { revision, files }
    }

    /// Overlay checksums from a `snapshot.json` document; unknown names are ignored
    pub fn apply_checksums(&mut self, checksums: BTreeMap<String, String>) {
        for (name, md5) in checksums {
            if let Some(entry) = self.files.get_mut(&name) {
                entry.checksum = Some(md5);
            }
        }
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.contains_key(file)
    }

    /// Well-known files present in this revision, in [`WELL_KNOWN_FILES`] order
    pub fn well_known(&self) -> impl Iterator<Item = &'static str> + '_ {
        WELL_KNOWN_FILES
            .into_iter()
            .filter(|file| self.contains(file))
    }
}
