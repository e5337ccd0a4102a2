//! Keep-policy strategies for duplicate groups.
//!
//! # Overview
//!
//! Every member of a [`DuplicateGroup`] has identical bytes, so which one to
//! keep is a matter of policy. A [`SelectionStrategy`] picks exactly one
//! member; the resolver removes the rest.
//!
//! | Strategy | Keeps |
//! |---|---|
//! | [`OldestByCreation`] | earliest creation time |
//! | [`NewestByModification`] | latest modification time |
//! | [`HighestResolution`] | largest image by pixel count |
//! | [`ShortestName`] | shortest file name |
//! | [`Composite`] | combination of the above |
//!
//! Strategies are deterministic: the same members in the same order always
//! produce the same answer.
//!
//! # Example
//!
//! ```
//! use arcdupe::scanner::FileEntry;
//! use arcdupe::selection::{SelectionStrategy, ShortestName};
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/a/holiday-copy.jpg"), 10),
//!     FileEntry::new(PathBuf::from("/a/holiday.jpg"), 10),
//! ];
//! assert_eq!(ShortestName.select_from(&files).unwrap(), 1);
//! ```

pub mod resolution;
pub mod strategies;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::duplicates::DuplicateGroup;
use crate::scanner::FileEntry;

pub use resolution::{image_dimensions, is_image_extension, HighestResolution, IMAGE_EXTENSIONS};
pub use strategies::{NewestByModification, OldestByCreation, ShortestName};

/// Policy that picks the member of a duplicate group to keep.
pub trait SelectionStrategy: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Pick an index from `files`, which always has two or more members.
    fn choose(&self, files: &[FileEntry]) -> usize;

    /// Every index that ranks equal-best under this strategy.
    ///
    /// The first element is always [`choose`](Self::choose)'s answer. When
    /// the strategy has nothing to go on, every index is returned.
    fn tied(&self, files: &[FileEntry]) -> Vec<usize> {
        vec![self.choose(files)]
    }

    /// Pick the index of the member to keep.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::EmptyGroup`] if `files` is empty.
    fn select_from(&self, files: &[FileEntry]) -> Result<usize, SelectionError> {
        match files.len() {
            0 => Err(SelectionError::EmptyGroup),
            1 => Ok(0),
            _ => Ok(self.choose(files)),
        }
    }

    /// Pick the member of `group` to keep.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::EmptyGroup`] if the group has no members.
    fn select(&self, group: &DuplicateGroup) -> Result<FileEntry, SelectionError> {
        let index = self.select_from(group.files())?;
        let keeper = group.files()[index].clone();
        log::debug!(
            "{} kept {} out of {}",
            self.name(),
            keeper.path.display(),
            group.count()
        );
        Ok(keeper)
    }
}

/// Errors raised by selection strategies.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// There was nothing to choose from.
    #[error("Cannot select from an empty group")]
    EmptyGroup,
}

/// Several strategies applied in order.
///
/// By default each strategy narrows the remaining set to its single winner,
/// so the first strategy alone decides the outcome and the rest only ever
/// see one member. With [`with_narrow_ties`](Self::with_narrow_ties) each
/// strategy instead keeps everything it ranks equal-best, leaving later
/// strategies to break the tie.
#[derive(Debug, Default)]
pub struct Composite {
    strategies: Vec<Box<dyn SelectionStrategy>>,
    narrow_ties: bool,
}

impl Composite {
    /// Chain `strategies` in order.
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn SelectionStrategy>>) -> Self {
        Self {
            strategies,
            narrow_ties: false,
        }
    }

    /// Pass ties from one strategy on to the next.
    #[must_use]
    pub fn with_narrow_ties(mut self, narrow_ties: bool) -> Self {
        self.narrow_ties = narrow_ties;
        self
    }

    fn run(&self, files: &[FileEntry]) -> Vec<usize> {
        let mut remaining: Vec<usize> = (0..files.len()).collect();

        for strategy in &self.strategies {
            if remaining.len() <= 1 {
                break;
            }
            let subset: Vec<FileEntry> = remaining.iter().map(|&i| files[i].clone()).collect();
            remaining = if self.narrow_ties {
                strategy
                    .tied(&subset)
                    .into_iter()
                    .map(|i| remaining[i])
                    .collect()
            } else {
                vec![remaining[strategy.choose(&subset)]]
            };
        }

        remaining
    }
}

impl SelectionStrategy for Composite {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn choose(&self, files: &[FileEntry]) -> usize {
        self.run(files).first().copied().unwrap_or(0)
    }

    fn tied(&self, files: &[FileEntry]) -> Vec<usize> {
        let remaining = self.run(files);
        if remaining.is_empty() {
            vec![0]
        } else {
            remaining
        }
    }
}

/// Named strategies available from configuration and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Keep the earliest-created copy
    Oldest,
    /// Keep the most recently modified copy
    #[default]
    Newest,
    /// Keep the highest-resolution image, else the newest copy
    Resolution,
    /// Keep the copy with the shortest file name
    ShortestName,
}

impl StrategyKind {
    /// Build the strategy this kind names.
    #[must_use]
    pub fn build(self) -> Box<dyn SelectionStrategy> {
        match self {
            Self::Oldest => Box::new(OldestByCreation),
            Self::Newest => Box::new(NewestByModification),
            Self::Resolution => {
                Box::new(HighestResolution::new().with_fallback(Box::new(NewestByModification)))
            }
            Self::ShortestName => Box::new(ShortestName),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Oldest => "oldest",
            Self::Newest => "newest",
            Self::Resolution => "resolution",
            Self::ShortestName => "shortest-name",
        };
        write!(f, "{name}")
    }
}
