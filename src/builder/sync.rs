//! Sync a linked framework into a stable location.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::util::fs::{copy_dir_all, ensure_dir, remove_dir_all_if_exists};

/// Replace `dest` with a copy of the tree at `src`.
///
/// Nothing from a previous sync survives: `dest` is removed before the new
/// copy is moved into place. The copy is staged next to `dest`, so `dest`
/// is only touched once the copy is complete.
pub fn sync_dir(src: &Path, dest: &Path) -> Result<()> {
    if !src.is_dir() {
        bail!("framework directory does not exist: {}", src.display());
    }

    let parent = dest
        .parent()
        .with_context(|| format!("sync destination has no parent: {}", dest.display()))?;
    ensure_dir(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".podforge-sync")
        .tempdir_in(parent)
        .with_context(|| format!("failed to create staging directory in {}", parent.display()))?;
    let staged = staging.path().join("framework");

    copy_dir_all(src, &staged)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dest.display()))?;

    remove_dir_all_if_exists(dest)?;
    std::fs::rename(&staged, dest).with_context(|| {
        format!(
            "failed to move {} into place at {}",
            staged.display(),
            dest.display()
        )
    })?;

    tracing::debug!("synced {} -> {}", src.display(), dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn framework(root: &Path) -> std::path::PathBuf {
        let src = root.join("build/bin/iosArm64/debugFramework");
        fs::create_dir_all(src.join("MultiPlatformLibrary.framework/Headers")).unwrap();
        fs::write(
            src.join("MultiPlatformLibrary.framework/MultiPlatformLibrary"),
            "binary",
        )
        .unwrap();
        src
    }

    #[test]
    fn test_sync_copies_tree() {
        let tmp = TempDir::new().unwrap();
        let src = framework(tmp.path());
        let dest = tmp.path().join("build/cocoapods/framework");

        sync_dir(&src, &dest).unwrap();

        assert_eq!(
            fs::read_to_string(dest.join("MultiPlatformLibrary.framework/MultiPlatformLibrary"))
                .unwrap(),
            "binary"
        );
        assert!(dest.join("MultiPlatformLibrary.framework/Headers").is_dir());
        // Source is untouched
        assert!(src.join("MultiPlatformLibrary.framework").is_dir());
    }

    #[test]
    fn test_sync_removes_stale_files() {
        let tmp = TempDir::new().unwrap();
        let src = framework(tmp.path());
        let dest = tmp.path().join("build/cocoapods/framework");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("sentinel"), "stale").unwrap();

        sync_dir(&src, &dest).unwrap();

        assert!(!dest.join("sentinel").exists());
        assert!(dest.join("MultiPlatformLibrary.framework").is_dir());
    }

    #[test]
    fn test_sync_leaves_no_staging_dir() {
        let tmp = TempDir::new().unwrap();
        let src = framework(tmp.path());
        let dest = tmp.path().join("out/framework");

        sync_dir(&src, &dest).unwrap();

        let leftovers: Vec<_> = fs::read_dir(tmp.path().join("out"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("framework")]);
    }

    #[test]
    fn test_sync_missing_source_keeps_dest() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("framework");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("previous"), "kept").unwrap();

        let err = sync_dir(&tmp.path().join("missing"), &dest).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
        assert!(dest.join("previous").exists());
    }
}
