//! Recoverable copies of files removed during deduplication.
//!
//! # Overview
//!
//! Before the resolver removes duplicates it can hand them to a
//! [`BackupStore`], which copies each file under a content-addressed name and
//! records the originals in a JSON manifest. A backup can later be listed,
//! inspected, restored to the original locations or to a flat directory, and
//! deleted.
//!
//! The store root is always injected; nothing here looks up a global
//! location.
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::backup::{BackupItem, BackupStore};
//! use std::path::PathBuf;
//!
//! let store = BackupStore::new("/var/lib/arcdupe/backups");
//! let id = store
//!     .create(&[BackupItem::new(PathBuf::from("/tmp/copy.txt"), 12)])
//!     .unwrap();
//! store.restore(&id, None).unwrap();
//! ```

pub mod manifest;
pub mod store;

pub use manifest::{BackupItem, BackupManifest, BackupRecord, BackupSummary};
pub use store::{BackupError, BackupStore};
