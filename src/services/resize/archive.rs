//! ZIP container for resized outputs

use std::io::{Cursor, Write};
use std::str::FromStr;
use thiserror::Error;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to add entry {name}: {source}")]
    Entry { name: String, source: ZipError },
    #[error("Failed to write entry {name}: {source}")]
    Write {
        name: String,
        source: std::io::Error,
    },
    #[error("Failed to finish archive: {0}")]
    Finish(ZipError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveCompression {
    Deflate,
    Stored,
}

impl ArchiveCompression {
    fn method(self) -> CompressionMethod {
        match self {
            ArchiveCompression::Deflate => CompressionMethod::Deflated,
            ArchiveCompression::Stored => CompressionMethod::Stored,
        }
    }
}

impl FromStr for ArchiveCompression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deflate" | "deflated" => Ok(ArchiveCompression::Deflate),
            "stored" | "store" | "none" => Ok(ArchiveCompression::Stored),
            other => Err(format!("unknown archive compression '{}'", other)),
        }
    }
}

/// Single-owner writer for one request's archive.
///
/// Entries are compressed as they are added so callers can drop the
/// uncompressed buffers right away. Every entry carries the same fixed
/// timestamp, so equal inputs give byte-identical archives.
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    entries: Vec<String>,
}

impl ArchiveWriter {
    pub fn new(compression: ArchiveCompression) -> Self {
        let options = SimpleFileOptions::default()
            .compression_method(compression.method())
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options,
            entries: Vec::new(),
        }
    }

    pub fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.zip
            .start_file(name, self.options)
            .map_err(|source| ArchiveError::Entry {
                name: name.to_string(),
                source,
            })?;
        self.zip
            .write_all(bytes)
            .map_err(|source| ArchiveError::Write {
                name: name.to_string(),
                source,
            })?;

        self.entries.push(name.to_string());
        Ok(())
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Write the central directory and return the archive bytes with the entry names
    pub fn finish(self) -> Result<(Vec<u8>, Vec<String>), ArchiveError> {
        let cursor = self.zip.finish().map_err(ArchiveError::Finish)?;
        Ok((cursor.into_inner(), self.entries))
    }
}
