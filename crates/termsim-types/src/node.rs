//! VFS node variants, shared by the VFS and by lesson snapshots.

use serde::{Deserialize, Serialize};

/// A single entry of the virtual filesystem.
///
/// Snapshots use the tagged form
/// `{ type = "dir", children = ["notas.txt"] }` or
/// `{ type = "file", content = "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    /// Child names in creation order.
    Dir {
        #[serde(default)]
        children: Vec<String>,
    },
    File {
        #[serde(default)]
        content: String,
    },
}

impl Node {
    pub fn empty_dir() -> Self {
        Self::Dir {
            children: Vec::new(),
        }
    }

    pub fn file(content: impl Into<String>) -> Self {
        Self::File {
            content: content.into(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Dir { .. })
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}
