use std::fmt;

use crate::recipe::RecipeCoordinates;

const POINTER_DOCUMENT: &str = "latest.json";
const LISTING_DOCUMENT: &str = "files.json";
const SNAPSHOT_DOCUMENT: &str = "snapshot.json";

/// Relative location inside the content store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey(String);

impl StoreKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn join(&self, segment: &str) -> Self {
        Self(format!("{}/{}", self.0, segment))
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Renders store keys for recipe coordinates
///
/// `tag` is the store-side branch every recipe is published under.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    tag: String,
}

impl StoreLayout {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    /// `{user}/{channel}/{tag}/{name}/{version}`
    pub fn recipe_root(&self, coords: &RecipeCoordinates) -> StoreKey {
        StoreKey(format!(
            "{}/{}/{}/{}/{}",
            coords.user, coords.channel, self.tag, coords.name, coords.version
        ))
    }

    pub fn pointer(&self, coords: &RecipeCoordinates) -> StoreKey {
        self.recipe_root(coords).join(POINTER_DOCUMENT)
    }

    /// Base path every file of `revision` lives under
    pub fn revision_root(&self, coords: &RecipeCoordinates, revision: &str) -> StoreKey {
        self.recipe_root(coords).join(revision)
    }

    pub fn listing(&self, coords: &RecipeCoordinates, revision: &str) -> StoreKey {
        self.revision_root(coords, revision).join(LISTING_DOCUMENT)
    }

    pub fn snapshot(&self, coords: &RecipeCoordinates, revision: &str) -> StoreKey {
        self.revision_root(coords, revision).join(SNAPSHOT_DOCUMENT)
    }

    pub fn file(&self, coords: &RecipeCoordinates, revision: &str, file: &str) -> StoreKey {
        self.revision_root(coords, revision).join("files").join(file)
    }
}
