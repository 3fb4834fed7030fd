//! Foundation types for termsim.
//!
//! This crate contains the types shared by the VFS and terminal crates:
//! error types, VFS nodes, transcript entries, the broadcast event union,
//! mission criteria, and the lesson configuration loaded from TOML.

pub mod config;
pub mod criterion;
pub mod error;
pub mod event;
pub mod node;
pub mod transcript;
