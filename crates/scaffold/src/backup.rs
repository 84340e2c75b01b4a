//! Output directory snapshots
//!
//! Before anything is written the output directory is packed into a
//! gzip'd tarball. If the run fails the directory is cleared and unpacked
//! again, or removed when it did not exist before.

use crate::error::{Error, Result};
use chrono::Local;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// State of the output directory before a run
#[derive(Debug)]
pub struct Snapshot {
    output_dir: PathBuf,
    /// None when the output directory did not exist
    archive: Option<PathBuf>,
}

impl Snapshot {
    /// Archive `output_dir` into `backup_dir`
    pub fn take(output_dir: &Path, backup_dir: &Path) -> Result<Self> {
        if !output_dir.exists() {
            log::debug!(
                "{} does not exist yet, nothing to back up",
                output_dir.display()
            );
            return Ok(Self {
                output_dir: output_dir.to_path_buf(),
                archive: None,
            });
        }

        fs::create_dir_all(backup_dir).map_err(|e| Error::io(backup_dir, e))?;
        let output_abs = output_dir
            .canonicalize()
            .map_err(|e| Error::io(output_dir, e))?;
        let backup_abs = backup_dir
            .canonicalize()
            .map_err(|e| Error::io(backup_dir, e))?;
        if backup_abs.starts_with(&output_abs) {
            return Err(Error::InvalidPath {
                path: backup_dir.display().to_string(),
                reason: "backup directory must be outside the output directory",
            });
        }

        let archive = archive_path(&backup_abs, &output_abs);
        write_archive(&output_abs, &archive)?;
        log::info!("Backed up {} to {}", output_dir.display(), archive.display());

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            archive: Some(archive),
        })
    }

    /// Archive file, if the output directory existed
    pub fn archive(&self) -> Option<&Path> {
        self.archive.as_deref()
    }

    /// Put the output directory back the way it was
    pub fn restore(&self) -> Result<()> {
        let Some(archive) = &self.archive else {
            if self.output_dir.exists() {
                log::info!("Removing {}", self.output_dir.display());
                fs::remove_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))?;
            }
            return Ok(());
        };

        clear_dir(&self.output_dir)?;

        let file = File::open(archive).map_err(|e| Error::io(archive, e))?;
        let mut tar = tar::Archive::new(GzDecoder::new(file));
        tar.set_preserve_permissions(true);
        tar.unpack(&self.output_dir)
            .map_err(|e| Error::io(&self.output_dir, e))?;

        log::info!(
            "Restored {} from {}",
            self.output_dir.display(),
            archive.display()
        );
        Ok(())
    }

    /// Delete the archive after a successful run
    pub fn discard(self) -> Result<()> {
        if let Some(archive) = &self.archive {
            fs::remove_file(archive).map_err(|e| Error::io(archive, e))?;
            log::debug!("Removed backup {}", archive.display());
        }
        Ok(())
    }

    /// Keep the archive, returning where it is
    pub fn keep(self) -> Option<PathBuf> {
        self.archive
    }
}

fn archive_path(backup_dir: &Path, output_dir: &Path) -> PathBuf {
    let name = output_dir
        .file_name()
        .map_or_else(|| "output".to_string(), |n| n.to_string_lossy().into_owned());
    let stamp = Local::now().format("%Y%m%d-%H%M%S");

    let mut candidate = backup_dir.join(format!("{name}-{stamp}.tar.gz"));
    let mut n = 1;
    while candidate.exists() {
        candidate = backup_dir.join(format!("{name}-{stamp}-{n}.tar.gz"));
        n += 1;
    }
    candidate
}

fn write_archive(dir: &Path, archive: &Path) -> Result<()> {
    let file = File::create(archive).map_err(|e| Error::io(archive, e))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    builder
        .append_dir_all(".", dir)
        .map_err(|e| Error::io(dir, e))?;
    builder
        .into_inner()
        .and_then(GzEncoder::finish)
        .map_err(|e| Error::io(archive, e))?;
    Ok(())
}

fn clear_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir).map_err(|e| Error::io(dir, e));
    }

    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
        let removed = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|e| Error::io(&path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        let backups = tmp.path().join("backups");
        (tmp, out, backups)
    }

    #[test]
    fn test_restore_brings_back_original_contents() {
        let (_tmp, out, backups) = setup();
        fs::create_dir_all(out.join("src")).unwrap();
        fs::write(out.join("src/lib.rs"), "original").unwrap();
        fs::write(out.join("keep.txt"), "keep").unwrap();

        let snapshot = Snapshot::take(&out, &backups).unwrap();
        assert!(snapshot.archive().unwrap().exists());

        fs::write(out.join("src/lib.rs"), "changed").unwrap();
        fs::write(out.join("new.txt"), "new").unwrap();
        fs::remove_file(out.join("keep.txt")).unwrap();

        snapshot.restore().unwrap();

        assert_eq!(fs::read_to_string(out.join("src/lib.rs")).unwrap(), "original");
        assert_eq!(fs::read_to_string(out.join("keep.txt")).unwrap(), "keep");
        assert!(!out.join("new.txt").exists());
    }

    #[test]
    fn test_restore_removes_directory_that_did_not_exist() {
        let (_tmp, out, backups) = setup();
        let snapshot = Snapshot::take(&out, &backups).unwrap();
        assert!(snapshot.archive().is_none());

        fs::create_dir_all(out.join("partial")).unwrap();
        snapshot.restore().unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn test_discard_removes_archive() {
        let (_tmp, out, backups) = setup();
        fs::create_dir_all(&out).unwrap();

        let snapshot = Snapshot::take(&out, &backups).unwrap();
        let archive = snapshot.archive().unwrap().to_path_buf();
        snapshot.discard().unwrap();
        assert!(!archive.exists());
    }

    #[test]
    fn test_keep_returns_archive() {
        let (_tmp, out, backups) = setup();
        fs::create_dir_all(&out).unwrap();

        let archive = Snapshot::take(&out, &backups).unwrap().keep().unwrap();
        assert!(archive.exists());
        assert!(archive.to_string_lossy().ends_with(".tar.gz"));
    }

    #[test]
    fn test_archive_names_do_not_collide() {
        let (_tmp, out, backups) = setup();
        fs::create_dir_all(&out).unwrap();

        let first = Snapshot::take(&out, &backups).unwrap().keep().unwrap();
        let second = Snapshot::take(&out, &backups).unwrap().keep().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_backup_dir_inside_output_is_rejected() {
        let (_tmp, out, _) = setup();
        fs::create_dir_all(&out).unwrap();

        let result = Snapshot::take(&out, &out.join(".backups"));
        assert!(matches!(result, Err(Error::InvalidPath { .. })));
    }
}
