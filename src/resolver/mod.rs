//! Revision and file-manifest resolution against the content store
//!
//! Both resolvers are read-only and idempotent. Absence and store failure are
//! reported the same way to the caller (`None`, i.e. not found) and are only
//! told apart in the logs: a missing document logs at `debug`, an unreachable
//! or malformed one at `warn`. Nothing here retries.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::recipe::{FileListing, FileManifest, RecipeCoordinates, Revision, validate_revision};
use crate::storage::{ContentStore, StoreKey, StoreLayout};

/// A current revision together with the store path its files live under
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRevision {
    pub revision: Revision,
    pub base: StoreKey,
}

#[derive(Clone)]
pub struct Resolver {
    store: Arc<dyn ContentStore>,
    layout: StoreLayout,
}

impl Resolver {
    pub fn new(store: Arc<dyn ContentStore>, layout: StoreLayout) -> Self {
        Self { store, layout }
    }

    /// Follow the current-revision pointer of `coords`
    pub async fn resolve_latest(&self, coords: &RecipeCoordinates) -> Option<ResolvedRevision> {
        let key = self.layout.pointer(coords);
        let revision: Revision = self.fetch_document(coords, &key).await?;

        if let Err(err) = validate_revision(&revision.revision) {
            warn!(recipe = %coords, %key, error = %err, "Pointer names an unusable revision");
            return None;
        }

        let base = self.layout.revision_root(coords, &revision.revision);
        debug!(recipe = %coords, revision = %revision.revision, "Resolved current revision");
        Some(ResolvedRevision { revision, base })
    }

    /// Read the file listing of `revision`
    pub async fn resolve_files(
        &self,
        coords: &RecipeCoordinates,
        revision: &str,
    ) -> Option<FileManifest> {
        let key = self.layout.listing(coords, revision);
        let listing: FileListing = self.fetch_document(coords, &key).await?;
        Some(FileManifest::from_listing(revision, listing))
    }

    /// Read the optional `snapshot.json` checksum document of `revision`
    pub async fn resolve_checksums(
        &self,
        coords: &RecipeCoordinates,
        revision: &str,
    ) -> Option<BTreeMap<String, String>> {
        let key = self.layout.snapshot(coords, revision);
        self.fetch_document(coords, &key).await
    }

    /// Direct store URL of one file, used as a redirect target
    pub fn file_location(&self, coords: &RecipeCoordinates, revision: &str, file: &str) -> String {
        self.store.url_for(&self.layout.file(coords, revision, file))
    }

    async fn fetch_document<T: DeserializeOwned>(
        &self,
        coords: &RecipeCoordinates,
        key: &StoreKey,
    ) -> Option<T> {
        let bytes = match self.store.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(recipe = %coords, %key, "Store document not found");
                return None;
            }
            Err(err) => {
                warn!(recipe = %coords, %key, error = %err, "Store read failed, answering not found");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(document) => Some(document),
            Err(err) => {
                warn!(recipe = %coords, %key, error = %err, "Store document is malformed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryContentStore;
    use serde_json::json;

    fn fixture() -> (Arc<MemoryContentStore>, Resolver, RecipeCoordinates) {
        let store = Arc::new(MemoryContentStore::new());
        let resolver = Resolver::new(store.clone(), StoreLayout::new("barbarian"));
        let coords = RecipeCoordinates::new("lyra", "1.5.1", "_", "_").unwrap();
        (store, resolver, coords)
    }

    #[tokio::test]
    async fn resolves_pointer_and_derives_base() {
        let (store, resolver, coords) = fixture();
        let layout = StoreLayout::new("barbarian");
        store.insert_json(
            &layout.pointer(&coords),
            &json!({"revision": "abc123", "time": "2021-01-01T00:00:00.000+0000"}),
        );

        let resolved = resolver.resolve_latest(&coords).await.unwrap();
        assert_eq!(resolved.revision.revision, "abc123");
        assert_eq!(resolved.base.as_str(), "_/_/barbarian/lyra/1.5.1/abc123");
    }

    #[tokio::test]
    async fn missing_pointer_is_not_found() {
        let (_store, resolver, coords) = fixture();
        assert!(resolver.resolve_latest(&coords).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_store_is_not_found() {
        let (store, resolver, coords) = fixture();
        store.set_unavailable(true);
        assert!(resolver.resolve_latest(&coords).await.is_none());
        assert!(resolver.resolve_files(&coords, "abc123").await.is_none());
    }

    #[tokio::test]
    async fn malformed_or_unsafe_pointer_is_not_found() {
        let (store, resolver, coords) = fixture();
        let layout = StoreLayout::new("barbarian");

        store.insert(&layout.pointer(&coords), "not json");
        assert!(resolver.resolve_latest(&coords).await.is_none());

        store.insert_json(&layout.pointer(&coords), &json!({"revision": "../../etc"}));
        assert!(resolver.resolve_latest(&coords).await.is_none());
    }

    #[tokio::test]
    async fn resolves_listing_and_checksums() {
        let (store, resolver, coords) = fixture();
        let layout = StoreLayout::new("barbarian");
        store.insert_json(
            &layout.listing(&coords, "abc123"),
            &json!({"files": {"conanfile.py": {}, "conan_export.tgz": {}}}),
        );
        store.insert_json(
            &layout.snapshot(&coords, "abc123"),
            &json!({"conanfile.py": "c8d339a433f888a6217afcaeb744b36a"}),
        );

        let manifest = resolver.resolve_files(&coords, "abc123").await.unwrap();
        assert_eq!(manifest.files.len(), 2);

        let checksums = resolver.resolve_checksums(&coords, "abc123").await.unwrap();
        assert_eq!(checksums["conanfile.py"], "c8d339a433f888a6217afcaeb744b36a");

        assert!(resolver.resolve_files(&coords, "other").await.is_none());
    }

    #[test]
    fn file_location_points_into_the_store() {
        let (_store, resolver, coords) = fixture();
        assert_eq!(
            resolver.file_location(&coords, "abc123", "conan_export.tgz"),
            "memory://_/_/barbarian/lyra/1.5.1/abc123/files/conan_export.tgz"
        );
    }
}
