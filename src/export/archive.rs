//! Packaging slices into a single ZIP archive.

use crate::export::{Artifact, FileNames, SliceImage};
use crate::{Capabilities, Result};

/// One file inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
}

/// The archive capability.
pub trait ArchiveBackend: Send + Sync {
    /// Build a complete archive holding `entries` in order.
    fn package(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>>;
}

/// Bundle `slices` as `<slug>_part<N>.png` entries of `<slug>_explanation.zip`.
///
/// Returns `Ok(None)` without doing anything when there is nothing to
/// package or no topic to name it after.
pub fn package_slices(capabilities: &Capabilities, slices: &[SliceImage], topic: &str) -> Result<Option<Artifact>> {
    if slices.is_empty() || topic.trim().is_empty() {
        log::debug!("nothing to package");
        return Ok(None);
    }
    let backend = capabilities.archive()?;

    let names = FileNames::new(topic);
    let entries = slices
        .iter()
        .enumerate()
        .map(|(i, slice)| {
            Ok(ArchiveEntry { name: names.part(i + 1), data: slice.decode()? })
        })
        .collect::<Result<Vec<_>>>()
        .map_err(|e| {
            log::error!("Error zipping images: {}", e);
            e
        })?;

    let bytes = backend.package(&entries)?;
    let filename = names.zip();
    log::info!("archive ready: {} ({} entries, {} bytes)", filename, entries.len(), bytes.len());
    Ok(Some(Artifact { filename, mime: "application/zip", bytes }))
}

#[cfg(feature = "archive")]
pub use zip_backend::ZipArchiveBackend;

#[cfg(feature = "archive")]
mod zip_backend {
    use super::{ArchiveBackend, ArchiveEntry};
    use crate::{Error, Result};
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Archive backend built on the `zip` crate.
    ///
    /// Entries are stored uncompressed unless a deflate level is set; PNG data
    /// gains little from a second compression pass.
    #[derive(Debug, Clone, Default)]
    pub struct ZipArchiveBackend {
        deflate_level: Option<i64>,
    }

    impl ZipArchiveBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_deflate(level: i64) -> Self {
            Self { deflate_level: Some(level) }
        }

        fn options(&self) -> SimpleFileOptions {
            match self.deflate_level {
                Some(level) => SimpleFileOptions::default()
                    .compression_method(CompressionMethod::Deflated)
                    .compression_level(Some(level)),
                None => SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
            }
        }
    }

    fn packaging<E: std::fmt::Display>(e: E) -> Error {
        Error::PackagingError(e.to_string())
    }

    impl ArchiveBackend for ZipArchiveBackend {
        fn package(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
            let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
            let options = self.options();
            for entry in entries {
                zip.start_file(entry.name.as_str(), options).map_err(packaging)?;
                zip.write_all(&entry.data).map_err(packaging)?;
            }
            let cursor = zip.finish().map_err(packaging)?;
            Ok(cursor.into_inner())
        }
    }
}
