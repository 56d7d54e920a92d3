//! dataio-core: hierarchical data trees behind a storage-agnostic facade
//!
//! This crate focuses on a small, well-factored surface:
//! - `DataNode` tree (scalars, lists, keyed levels) with in-place add/set
//! - Dotted path resolution (`server.ports.0`) and typed, default-returning getters
//! - Pluggable backends (JSON, YAML) behind a registry for load/list/serialize
//!
//! ```
//! use dataio_core::{BackendRegistry, DataNode};
//!
//! let registry = BackendRegistry::default();
//! let mut root = registry.create_empty();
//! root.add_level(Some("server"));
//! root.set_number(Some("server.port"), 8080.0);
//! assert_eq!(root.get_number(0.0, "server.port"), 8080.0);
//! assert_eq!(root.get_number(-1.0, "server.missing"), -1.0);
//!
//! let text = registry.serialize(&root).unwrap();
//! let back: DataNode = registry.load_string(&text).unwrap();
//! assert_eq!(back, root);
//! ```
//!
pub mod backend;
pub mod error;
pub mod node;
pub mod path;
mod query;
pub mod storage;

/// Maximum rendered length of a path, in UTF-8 bytes.
pub const MAX_PATH_LENGTH: usize = 256;
/// Byte budget for a string value including its terminator; payload is one less.
pub const MAX_VALUE_LENGTH: usize = 128;

pub use backend::{Backend, BackendRegistry, JsonBackend, StorageConfig, YamlBackend};
pub use error::{DataError, Result};
pub use node::{DataNode, Level, NodeKind, Scalar};
pub use path::{DataPath, PathSegment, ToPath};
