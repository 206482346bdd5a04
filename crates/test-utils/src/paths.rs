//! Temporary data directories for filesystem reader tests.
//!
//! The layout matches what the filesystem reader expects:
//!
//! ```text
//! {root}/ty_list.csv
//! {root}/radar/RAD/
//! {root}/radar/QPE/
//! {root}/ty_info/
//! {root}/static/
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory tree, removed on drop.
pub struct TempDataDir {
    dir: TempDir,
}

impl TempDataDir {
    /// Create the directory tree.
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        for sub in ["radar/RAD", "radar/QPE", "ty_info", "static"] {
            fs::create_dir_all(dir.path().join(sub))?;
        }
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn event_list(&self) -> PathBuf {
        self.root().join("ty_list.csv")
    }

    pub fn field_root(&self) -> PathBuf {
        self.root().join("radar")
    }

    pub fn scalar_root(&self) -> PathBuf {
        self.root().join("ty_info")
    }

    pub fn static_root(&self) -> PathBuf {
        self.root().join("static")
    }

    /// Write `contents` to a path relative to the root.
    pub fn write(&self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> io::Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_data_dir_layout() {
        let data = TempDataDir::new().unwrap();
        assert!(data.field_root().join("RAD").is_dir());
        assert!(data.field_root().join("QPE").is_dir());
        assert!(data.scalar_root().is_dir());
        assert!(data.static_root().is_dir());

        let path = data.write("ty_list.csv", "En name\n").unwrap();
        assert_eq!(path, data.event_list());
        assert!(path.is_file());
    }
}
