//! Resolution-based keep strategy.
//!
//! Dimensions come from the image header only; pixel data is never decoded.
//! Plain files are probed by path, archive entries from their buffered bytes.

use std::io::{Cursor, Read};

use ::image::ImageReader;

use super::SelectionStrategy;
use crate::scanner::FileEntry;

/// File extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "ico",
];

/// Whether `ext` (without the dot) names an image format.
#[must_use]
pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// Read `(width, height)` for an entry, if it is a decodable image.
#[must_use]
pub fn image_dimensions(entry: &FileEntry) -> Option<(u32, u32)> {
    let result = match &entry.archive {
        Some(member) => {
            let mut bytes = Vec::new();
            if let Err(e) = member.content.open().and_then(|mut r| r.read_to_end(&mut bytes)) {
                log::debug!("Cannot read {}: {}", entry.path.display(), e);
                return None;
            }
            ImageReader::new(Cursor::new(bytes))
                .with_guessed_format()
                .map_err(::image::ImageError::IoError)
                .and_then(ImageReader::into_dimensions)
        }
        None => ::image::image_dimensions(&entry.path),
    };

    match result {
        Ok(dims) => Some(dims),
        Err(e) => {
            log::debug!("No dimensions for {}: {}", entry.path.display(), e);
            None
        }
    }
}

/// Keep the image with the most pixels.
///
/// Only members with an image extension and readable dimensions compete;
/// the first wins ties. When none qualifies the fallback strategy decides
/// over the whole set, or the first member is kept if there is none.
#[derive(Debug, Default)]
pub struct HighestResolution {
    fallback: Option<Box<dyn SelectionStrategy>>,
}

impl HighestResolution {
    /// Create the strategy without a fallback.
    #[must_use]
    pub fn new() -> Self {
        Self { fallback: None }
    }

    /// Strategy used when no member has resolvable dimensions.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Box<dyn SelectionStrategy>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn ranked(files: &[FileEntry]) -> Vec<(usize, u64)> {
        files
            .iter()
            .enumerate()
            .filter(|(_, f)| f.extension().is_some_and(|e| is_image_extension(&e)))
            .filter_map(|(idx, f)| {
                image_dimensions(f).map(|(w, h)| (idx, u64::from(w) * u64::from(h)))
            })
            .collect()
    }

    fn fallback_tied(&self, files: &[FileEntry]) -> Vec<usize> {
        match &self.fallback {
            Some(fallback) => fallback.tied(files),
            None => (0..files.len()).collect(),
        }
    }
}

impl SelectionStrategy for HighestResolution {
    fn name(&self) -> &'static str {
        "highest-resolution"
    }

    fn choose(&self, files: &[FileEntry]) -> usize {
        self.tied(files)[0]
    }

    fn tied(&self, files: &[FileEntry]) -> Vec<usize> {
        let ranked = Self::ranked(files);
        let Some(best) = ranked.iter().map(|(_, pixels)| *pixels).max() else {
            log::debug!("No measurable images among {} members", files.len());
            return self.fallback_tied(files);
        };
        ranked
            .into_iter()
            .filter(|(_, pixels)| *pixels == best)
            .map(|(idx, _)| idx)
            .collect()
    }
}
