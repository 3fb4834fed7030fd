//! Virtual file system for termsim.
//!
//! The VFS is a flat map from normalized absolute path to [`Node`].
//! Directories keep their children in creation order so listings reflect
//! the order in which entries were made.

mod memory;
pub mod path;

pub use memory::MemoryVfs;
pub use path::{file_name, join, normalize, parent, resolve_path};
pub use termsim_types::node::Node;

/// What kind of node a path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}
