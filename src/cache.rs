//! Render cache for social cards.
//!
//! Rendering a card means laying out and rasterizing three text blocks at
//! 1200×630, which dwarfs everything else a page costs. This module lets
//! repeated builds skip rendering for cards whose text hasn't changed.
//!
//! # Design
//!
//! The cache is **content-addressed**: an entry is the PNG
//! `<cache_dir>/<fingerprint>.png`, where the fingerprint is the MD5 of the
//! card's site name, title and description (see [`crate::card`]). Page paths
//! play no part in the key, so moving or renaming a page never invalidates
//! its card, and two pages with identical text share one entry.
//!
//! A cache hit is simply "the file exists". There is no manifest, no expiry
//! and no invalidation: delete the cache directory to start over. Changing
//! the palette, logo or font therefore requires clearing the cache by hand.
//!
//! ## Writes
//!
//! Entries are append-only. A miss renders the card, encodes it into a temp
//! file inside the cache directory and persists it under the final name
//! without clobbering. Consequences:
//!
//! - a failed render or encode leaves no file behind, so a later build never
//!   mistakes a half-written PNG for a hit;
//! - two jobs racing on the same fingerprint both render, the first to
//!   persist wins and the other discards its identical copy.
//!
//! ## Publishing
//!
//! [`RenderCache::publish`] resolves the entry (hit or miss) and copies it to
//! the page's destination, creating missing directories. A failed copy leaves
//! the entry valid for future builds.

use crate::card::Fingerprint;
use image::{ImageFormat, RgbaImage};
use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write cache entry {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to encode card {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// How an entry was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Entry already existed; nothing was rendered.
    Hit,
    /// Entry was rendered in this build.
    Rendered,
}

/// Result of resolving one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutcome {
    /// Path of the cache entry.
    pub path: PathBuf,
    pub status: CacheStatus,
}

/// On-disk card cache shared by every render job of a build.
#[derive(Debug)]
pub struct RenderCache {
    dir: PathBuf,
    hits: AtomicU32,
    misses: AtomicU32,
}

impl RenderCache {
    /// Open the cache at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            hits: AtomicU32::new(0),
            misses: AtomicU32::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `fingerprint`, whether or not it exists.
    pub fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{fingerprint}.png"))
    }

    /// Return the entry for `fingerprint`, rendering it on a miss.
    ///
    /// `render` is not invoked on a hit. If it fails, its error is returned
    /// and nothing is written.
    pub fn obtain<E, F>(&self, fingerprint: &Fingerprint, render: F) -> Result<CacheOutcome, E>
    where
        F: FnOnce() -> Result<RgbaImage, E>,
        E: From<CacheError>,
    {
        let path = self.entry_path(fingerprint);
        if path.is_file() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(%fingerprint, "cache hit");
            return Ok(CacheOutcome {
                path,
                status: CacheStatus::Hit,
            });
        }

        let image = render()?;
        self.store(&path, &image)?;
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%fingerprint, "cache miss, rendered");
        Ok(CacheOutcome {
            path,
            status: CacheStatus::Rendered,
        })
    }

    /// [`obtain`](Self::obtain) the entry, then copy it to `dest`.
    pub fn publish<E, F>(
        &self,
        fingerprint: &Fingerprint,
        dest: &Path,
        render: F,
    ) -> Result<CacheOutcome, E>
    where
        F: FnOnce() -> Result<RgbaImage, E>,
        E: From<CacheError>,
    {
        let outcome = self.obtain(fingerprint, render)?;
        copy_entry(&outcome.path, dest)?;
        Ok(outcome)
    }

    /// Hits and misses counted so far.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn store(&self, path: &Path, image: &RgbaImage) -> Result<(), CacheError> {
        let write_err = |source: io::Error| CacheError::Write {
            path: path.to_path_buf(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            image
                .write_to(&mut writer, ImageFormat::Png)
                .map_err(|source| CacheError::Encode {
                    path: path.to_path_buf(),
                    source,
                })?;
            writer.flush().map_err(write_err)?;
        }

        match tmp.persist_noclobber(path) {
            Ok(_) => Ok(()),
            // Lost a race against an identical render.
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(write_err(e.error)),
        }
    }
}

fn copy_entry(from: &Path, to: &Path) -> Result<(), CacheError> {
    if let Some(parent) = to.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| CacheError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::copy(from, to).map_err(|source| CacheError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Summary of cache performance for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} rendered", self.misses)
        }
    }
}
