//! Filesystem helpers shared by the pipelines

use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::Result;

/// Destructively reset a directory to an empty state
///
/// The caller owns the directory exclusively for the duration of a run;
/// nothing from a previous run survives.
pub fn reset_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        debug!(dir = %dir.display(), "removing existing directory");
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Recursively copy a directory tree, preserving symlinks
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under its root");
        let target = dest.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            if target.exists() {
                fs::remove_file(&target)?;
            }
            std::os::unix::fs::symlink(link, &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_dir_empties_existing_contents() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("out");
        fs::create_dir_all(dir.join("stale")).unwrap();
        fs::write(dir.join("stale/file.txt"), "old").unwrap();

        reset_dir(&dir).unwrap();

        assert!(dir.exists());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_dir_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("fresh");
        reset_dir(&dir).unwrap();
        assert!(dir.exists());
    }

    #[test]
    fn test_copy_tree_preserves_layout() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.py"), "pass").unwrap();
        fs::write(src.join("sub/b.py"), "pass").unwrap();

        let dest = temp.path().join("dest");
        copy_tree(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("a.py")).unwrap(), "pass");
        assert_eq!(fs::read_to_string(dest.join("sub/b.py")).unwrap(), "pass");
    }
}
