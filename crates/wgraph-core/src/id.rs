//! Short file identifiers for persisted vertices.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound (exclusive) of the random numeric suffix.
pub const FILE_ID_SUFFIX_RANGE: u32 = 100_000;

const PREFIX_LEN: usize = 3;
const PREFIX_PAD: char = 'v';

/// Opaque, filesystem-safe identifier naming one vertex file.
///
/// Built from the first three ASCII alphanumerics of the label's JSON form
/// followed by a random numeric suffix, e.g. `ber40211`. Labels never appear
/// in file names directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Generate a candidate id for a label given its JSON representation
    pub fn generate(label_json: &str) -> Self {
        let suffix = rand::rng().random_range(0..FILE_ID_SUFFIX_RANGE);
        Self::with_suffix(label_json, suffix)
    }

    /// Build an id from a label and an explicit suffix
    pub fn with_suffix(label_json: &str, suffix: u32) -> Self {
        let mut prefix: String = label_json
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(PREFIX_LEN)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        while prefix.len() < PREFIX_LEN {
            prefix.push(PREFIX_PAD);
        }
        Self(format!("{}{}", prefix, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<FileId> for String {
    fn from(id: FileId) -> Self {
        id.0
    }
}
