//! File actions module.
//!
//! This module provides functionality for:
//! - Reversible removal via the trash crate ([`delete`])
//! - Resolving duplicate groups: keep one, back up and remove the rest
//!   ([`resolve`])
//!
//! # Resolution
//!
//! ```no_run
//! use arcdupe::actions::{Resolver, TrashRemover};
//! use arcdupe::archive::ZipStreamReader;
//! use arcdupe::backup::BackupStore;
//! use arcdupe::selection::NewestByModification;
//! use std::sync::Arc;
//!
//! let resolver = Resolver::new(
//!     Box::new(NewestByModification),
//!     Arc::new(ZipStreamReader::new()),
//!     Arc::new(TrashRemover),
//! )
//! .with_backup_store(BackupStore::new("/tmp/arcdupe-backups"));
//! # let groups = Vec::new();
//! for result in resolver.process_all(&groups, true) {
//!     println!("backup: {}", result.backup);
//! }
//! ```

pub mod delete;
pub mod resolve;

pub use delete::{
    delete_batch, delete_to_trash, permanent_delete, validate_preserves_copy, BatchDeleteResult,
    DeleteError, DeleteResult, PermanentRemover, Remover, TrashRemover,
};
pub use resolve::{
    filtered_output_dir, BackupRef, ResolutionResult, ResolveError, Resolver, FILTERED_SUFFIX,
};
