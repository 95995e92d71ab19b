//! Depth-1 directory walk over a configuration root

use crate::domain::FileFormat;
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One candidate file found under `<root>/<app-dir>/`.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub app_dir: String,
    pub filename: String,
    pub format: FileFormat,
    pub bytes: Vec<u8>,
}

/// Counters collected during a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub app_dirs: usize,
    pub files_seen: usize,
    pub files_skipped_extension: usize,
    pub files_unreadable: usize,
    /// Links left unvisited because following is disabled.
    pub symlinks_skipped: usize,
}

/// Walks `<root>/<app-dir>/<file>` pairs.
///
/// Files sitting directly under the root and anything nested deeper than one
/// application directory are ignored.
pub struct SourceWalker {
    root: PathBuf,
    follow_symlinks: bool,
    stats: WalkStats,
}

impl SourceWalker {
    /// Symbolic links to application directories and files are followed by default.
    pub fn new(root: PathBuf) -> Self {
        Self { root, follow_symlinks: true, stats: WalkStats::default() }
    }

    /// Set whether to follow symbolic links
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Walk the root and read every supported file.
    ///
    /// A missing root yields an empty list. Files are returned sorted by path.
    pub fn walk(&mut self) -> Result<Vec<SourceFile>> {
        self.stats = WalkStats::default();

        if !self.root.exists() {
            tracing::warn!("Config root directory not found: {}", self.root.display());
            return Ok(Vec::new());
        }
        if !self.root.is_dir() {
            return Err(ConfigError::Io {
                path: self.root.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "config root is not a directory",
                ),
            });
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(2)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    if err.depth() == 0 {
                        return Err(ConfigError::Io {
                            path: self.root.clone(),
                            source: err
                                .into_io_error()
                                .unwrap_or_else(|| std::io::Error::other("walk failed")),
                        });
                    }
                    tracing::warn!("Skipping unreadable entry under {}: {}", self.root.display(), err);
                    self.stats.files_unreadable += 1;
                    continue;
                }
            };

            if entry.file_type().is_symlink() {
                tracing::debug!("Not following symlink {}", entry.path().display());
                self.stats.symlinks_skipped += 1;
                continue;
            }

            if entry.depth() == 1 {
                if entry.file_type().is_dir() {
                    self.stats.app_dirs += 1;
                }
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            self.stats.files_seen += 1;

            let Some(filename) = entry.file_name().to_str().map(str::to_string) else {
                self.stats.files_unreadable += 1;
                continue;
            };
            let Some(format) = FileFormat::from_filename(&filename) else {
                self.stats.files_skipped_extension += 1;
                continue;
            };
            let app_dir = entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str())
                .unwrap_or("")
                .to_string();

            let bytes = match std::fs::read(entry.path()) {
                Ok(b) => b,
                Err(err) => {
                    tracing::warn!("Error loading {}: {}", entry.path().display(), err);
                    self.stats.files_unreadable += 1;
                    continue;
                }
            };

            files.push(SourceFile { app_dir, filename, format, bytes });
        }

        tracing::debug!(
            "Walked {}: {} app dirs, {} files seen, {} supported",
            self.root.display(),
            self.stats.app_dirs,
            self.stats.files_seen,
            files.len()
        );

        Ok(files)
    }

    /// Get walk statistics
    pub fn stats(&self) -> &WalkStats {
        &self.stats
    }
}
