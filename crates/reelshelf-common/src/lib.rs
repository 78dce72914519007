//! Reelshelf-Common: Shared types, constants, and utilities.
//!
//! - **Typed IDs**: UUID wrappers for catalog items and scan runs
//! - **Core Types**: media kinds and scan statuses
//! - **Path Utilities**: video-file detection by extension
//! - **Error Handling**: the common error type and result alias
//!
//! # Examples
//!
//! ```
//! use reelshelf_common::{ItemId, MediaKind, Error, Result};
//! use reelshelf_common::paths::is_video_file;
//! use std::path::Path;
//!
//! let item_id = ItemId::new();
//! let kind: MediaKind = "TV Shows".parse().unwrap();
//! assert_eq!(kind, MediaKind::TvShow);
//! assert!(is_video_file(Path::new("movie.mkv")));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("item"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
