//! Graph identity - the key that scopes cached positions to one document root.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Identity of one visualized document root.
///
/// Derived from the root path so that two different roots never share cached
/// positions, while spellings of the same root (`docs`, `docs/`, `./docs`,
/// `docs\`) collapse to one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(String);

impl GraphId {
    /// Derive the identity of the document root at `root`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let raw = root.as_ref().to_string_lossy().replace('\\', "/");
        let absolute = raw.starts_with('/');

        let mut id = raw
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect::<Vec<_>>()
            .join("/");

        if absolute {
            id.insert(0, '/');
        }
        if id.is_empty() {
            id.push('.');
        }
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GraphId {
    fn from(root: &str) -> Self {
        Self::from_root(root)
    }
}
