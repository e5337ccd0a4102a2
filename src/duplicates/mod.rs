//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based grouping of candidates
//! - Content hashing of same-size candidates
//! - Duplicate group management

pub mod finder;
pub mod groups;

pub use finder::{
    DuplicateFinder, FinderConfig, FinderError, ScanSummary, DEFAULT_IO_THREADS,
    DEFAULT_MIN_SIZE,
};
pub use groups::{group_by_hash, group_by_size, DuplicateGroup, GroupError, GroupingStats, SizeGroup};
