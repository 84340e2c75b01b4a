//! Template repository storage
//!
//! A [`Repository`] is the capability interface the resolver and renderer
//! work against. [`LocalRepository`] stores templates in a directory tree;
//! [`open_repository`] picks the backend from the address syntax.

use crate::error::{Error, Result};
use crate::path::{self, normalize};
use crate::types::{METAFILE_NAME, Metafile};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every template in a repository keyed by its repository-relative path.
/// The root template is keyed by `""`.
pub type Metamap = BTreeMap<String, Metafile>;

/// Storage backend holding templates
///
/// All paths are relative to the repository root and are validated with
/// [`normalize`] before touching storage.
pub trait Repository {
    /// Human-readable location of the repository
    fn location(&self) -> String;

    /// Read the metadata of the template at `path`
    fn open_meta(&self, path: &str) -> Result<Metafile>;

    /// Write `meta` to the template directory named by `meta.path`
    fn save_meta(&self, meta: &Metafile) -> Result<()>;

    /// Whether a file or directory exists at `path`
    fn exists(&self, path: &str) -> bool;

    /// Read raw file contents
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Write raw file contents, creating parent directories
    fn write_file(&self, path: &str, contents: &[u8]) -> Result<()>;

    /// Create a directory and its parents
    fn mkdir(&self, path: &str) -> Result<()>;

    /// Walk the whole repository and read every metadata file
    fn load_metamap(&self) -> Result<Metamap>;
}

/// Repository backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the repository
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute filesystem path for a repository-relative path
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let normalized = normalize(path)?;
        if normalized.is_empty() {
            Ok(self.root.clone())
        } else {
            Ok(self.root.join(normalized))
        }
    }

    fn meta_file(&self, path: &str) -> Result<PathBuf> {
        Ok(self.resolve(path)?.join(METAFILE_NAME))
    }

    fn read_meta_at(file: &Path, key: String) -> Result<Metafile> {
        let content = fs::read_to_string(file).map_err(|e| Error::io(file, e))?;
        let mut meta: Metafile = serde_json::from_str(&content).map_err(|e| Error::Parse {
            path: file.to_path_buf(),
            source: e,
        })?;
        meta.path = key;
        Ok(meta)
    }
}

impl Repository for LocalRepository {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn open_meta(&self, path: &str) -> Result<Metafile> {
        let key = normalize(path)?;
        let file = self.meta_file(&key)?;
        if !file.is_file() {
            return Err(Error::NotFound(key));
        }
        Self::read_meta_at(&file, key)
    }

    fn save_meta(&self, meta: &Metafile) -> Result<()> {
        let dir = self.resolve(&meta.path)?;
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let file = dir.join(METAFILE_NAME);
        let mut content = serde_json::to_string_pretty(meta).map_err(|e| Error::Parse {
            path: file.clone(),
            source: e,
        })?;
        content.push('\n');
        fs::write(&file, content).map_err(|e| Error::io(&file, e))?;

        log::debug!("Saved metadata to {}", file.display());
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok_and(|p| p.exists())
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let file = self.resolve(path)?;
        fs::read(&file).map_err(|e| Error::io(&file, e))
    }

    fn write_file(&self, path: &str, contents: &[u8]) -> Result<()> {
        let file = self.resolve(path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&file, contents).map_err(|e| Error::io(&file, e))
    }

    fn mkdir(&self, path: &str) -> Result<()> {
        let dir = self.resolve(path)?;
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))
    }

    fn load_metamap(&self) -> Result<Metamap> {
        let mut map = Metamap::new();
        if !self.root.is_dir() {
            return Err(Error::NotFound(self.location()));
        }

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git");

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || entry.file_name() != METAFILE_NAME {
                continue;
            }

            let dir = entry.path().parent().unwrap_or(&self.root);
            let rel = dir.strip_prefix(&self.root).unwrap_or(dir);
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let meta = Self::read_meta_at(entry.path(), key.clone())?;
            log::trace!("Loaded template '{}'", key);
            map.insert(key, meta);
        }

        log::debug!("Loaded {} templates from {}", map.len(), self.location());
        Ok(map)
    }
}

/// Open the repository an address points into
///
/// `template` is the path part of an address (group suffix already removed):
///
/// - `scheme://...` is rejected; only local repositories exist
/// - an absolute filesystem path is a repository of its own, addressed at its root
/// - anything else is a template path inside `default_root`
///
/// Returns the repository and the normalized template path inside it.
pub fn open_repository(
    template: &str,
    default_root: &Path,
) -> Result<(Box<dyn Repository>, String)> {
    if let Some((scheme, _)) = template.split_once("://") {
        return Err(Error::UnsupportedRepository(format!("{scheme}://")));
    }

    if Path::new(template).is_absolute() {
        log::debug!("Using {} as repository root", template);
        return Ok((Box::new(LocalRepository::new(template)), String::new()));
    }

    let key = normalize(template)?;
    Ok((Box::new(LocalRepository::new(default_root)), key))
}

/// Name shown for a template path
pub fn template_name(path: &str) -> &str {
    path::base_name(path).unwrap_or(".")
}
