//! Source discovery: enumerate `<root>/<app-dir>/<file>` pairs

use crate::error::Result;
use std::path::Path;

pub mod walker;

pub use walker::{SourceFile, SourceWalker, WalkStats};

pub fn walk_config_root<P: AsRef<Path>>(root: P, follow_symlinks: bool) -> Result<(Vec<SourceFile>, WalkStats)> {
    let mut walker = SourceWalker::new(root.as_ref().to_path_buf()).follow_symlinks(follow_symlinks);
    let files = walker.walk()?;
    let stats = walker.stats().clone();
    Ok((files, stats))
}
