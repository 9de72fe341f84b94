use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel for an unscoped user or channel
pub const UNSCOPED: &str = "_";

const MAX_SEGMENT_BYTES: usize = 100;
const MAX_REVISION_BYTES: usize = 64;
const MAX_FILENAME_BYTES: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} exceeds {limit} bytes")]
    TooLong { field: &'static str, limit: usize },

    #[error("{field} contains characters outside [A-Za-z0-9_+.-]: '{value}'")]
    InvalidCharacters { field: &'static str, value: String },

    #[error("{field} must not be a relative path component: '{value}'")]
    RelativeComponent { field: &'static str, value: String },
}

/// Recipe coordinates: four opaque, case-sensitive path segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecipeCoordinates {
    pub name: String,
    pub version: String,
    pub user: String,
    pub channel: String,
}

impl RecipeCoordinates {
    /// Build coordinates, collecting every invalid segment
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        user: impl Into<String>,
        channel: impl Into<String>,
    ) -> Result<Self, Vec<CoordinateError>> {
        let coordinates = Self {
            name: name.into(),
            version: version.into(),
            user: user.into(),
            channel: channel.into(),
        };

        let errors: Vec<CoordinateError> = [
            ("name", coordinates.name.as_str()),
            ("version", coordinates.version.as_str()),
            ("user", coordinates.user.as_str()),
            ("channel", coordinates.channel.as_str()),
        ]
        .into_iter()
        .filter_map(|(field, value)| validate_segment(field, value, MAX_SEGMENT_BYTES).err())
        .collect();

        if errors.is_empty() {
            Ok(coordinates)
        } else {
            Err(errors)
        }
    }

    /// `name/version@user/channel`
    pub fn reference(&self) -> String {
        format!("{}/{}@{}/{}", self.name, self.version, self.user, self.channel)
    }

    pub fn is_unscoped(&self) -> bool {
        self.user == UNSCOPED && self.channel == UNSCOPED
    }
}

impl fmt::Display for RecipeCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference())
    }
}

pub fn validate_revision(revision: &str) -> Result<(), CoordinateError> {
    validate_segment("revision", revision, MAX_REVISION_BYTES)
}

/// Filenames are single path segments and never hidden files
pub fn validate_filename(file: &str) -> Result<(), CoordinateError> {
    validate_segment("file", file, MAX_FILENAME_BYTES)?;
    if file.starts_with('.') {
        return Err(CoordinateError::RelativeComponent {
            field: "file",
            value: file.to_string(),
        });
    }
    Ok(())
}

fn validate_segment(field: &'static str, value: &str, limit: usize) -> Result<(), CoordinateError> {
    if value.is_empty() {
        return Err(CoordinateError::Empty { field });
    }

    if value.len() > limit {
        return Err(CoordinateError::TooLong { field, limit });
    }

    if value == "." || value == ".." {
        return Err(CoordinateError::RelativeComponent {
            field,
            value: value.to_string(),
        });
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '.' | '-');
    if !value.chars().all(allowed) {
        return Err(CoordinateError::InvalidCharacters {
            field,
            value: value.to_string(),
        });
    }

    Ok(())
}
