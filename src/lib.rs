//! In-memory source-code indexing engine with an MCP stdio front end.
//!
//! Scans a project root at startup, keeps a dual index (file paths plus an
//! inverted full-text structure) synchronized with disk through a debounced
//! recursive watcher and a periodic reconciler, and answers content, glob,
//! and read queries from memory.

pub mod cli;
pub mod error;
pub mod index;
pub mod indexing;
pub mod language;
pub mod matcher;
pub mod mcp;
pub mod sync;
pub mod watcher;

pub use error::{IndexError, Result};
pub use index::{ContentIndex, FileIndex, IndexedFile, SearchOptions};
pub use matcher::{IgnoreMatcher, MatcherOptions};
