//! Reelshelf-DB: Database schema, migrations, and query operations
//!
//! SQLite storage for the media catalog using rusqlite and r2d2 connection
//! pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use reelshelf_common::MediaKind;
//! use reelshelf_db::models::LibraryItem;
//! use reelshelf_db::pool::{init_pool, get_conn};
//! use reelshelf_db::queries::items;
//!
//! let pool = init_pool("/var/lib/reelshelf/library.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let item = LibraryItem::new("/media/Heat.1995.mkv", MediaKind::Movie, "Heat");
//! items::upsert_item(&conn, &item).unwrap();
//! println!("{} items", items::count_items(&conn).unwrap());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
