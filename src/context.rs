//! Installation context, the directory roots shared by all install steps.

use std::path::PathBuf;
use std::time::SystemTime;
use std::fs;

use crate::path::{PathExt, PathBufExt};


/// An installation context groups the directories of a Minecraft installation:
/// the main directory contains `versions`, `assets`, `libraries` and `jvm`,
/// the working directory is the game directory where the process runs and
/// where the per-launch `bin` directories and the auth database are stored.
///
/// A context is cheap plain data, distinct contexts may coexist, but a single
/// install should be in flight at a time on a given context.
#[derive(Debug, Clone)]
pub struct Context {
    /// The working (game) directory.
    pub work_dir: PathBuf,
    /// The directory where versions metadata and JAR files are stored.
    pub versions_dir: PathBuf,
    /// The directory where assets indexes and objects are stored.
    pub assets_dir: PathBuf,
    /// The directory where libraries are stored, laid out like a maven repo.
    pub libraries_dir: PathBuf,
    /// The directory where Mojang-provided JVMs are installed.
    pub jvm_dir: PathBuf,
    /// The directory containing the per-launch natives directories.
    pub bin_dir: PathBuf,
}

impl Context {

    /// Create a context from a main directory, the working directory defaults
    /// to the main directory itself.
    pub fn new(main_dir: impl Into<PathBuf>) -> Self {
        let main_dir = main_dir.into();
        Self::new_with_work_dir(main_dir.clone(), main_dir)
    }

    /// Create a context from distinct main and working directories.
    pub fn new_with_work_dir(main_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        let main_dir = main_dir.into();
        let work_dir = work_dir.into();
        Self {
            versions_dir: main_dir.join("versions"),
            assets_dir: main_dir.join("assets"),
            libraries_dir: main_dir.join("libraries"),
            jvm_dir: main_dir.join("jvm"),
            bin_dir: work_dir.join("bin"),
            work_dir,
        }
    }

    /// Same as [`Self::new`] but using the default main directory of the
    /// system, returning none if the system has no default main directory.
    pub fn new_with_default() -> Option<Self> {
        Some(Self::new(default_main_dir()?))
    }

    /// Return the directory of a version, where its metadata and JAR live.
    #[inline]
    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir.join(id)
    }

    /// Return the metadata file path of a version.
    #[inline]
    pub fn version_metadata_file(&self, id: &str) -> PathBuf {
        self.version_dir(id).joined(id).appended(".json")
    }

    /// Return true if the given version has a metadata file.
    pub fn has_version_metadata(&self, id: &str) -> bool {
        self.version_metadata_file(id).is_file()
    }

    /// Iterate over installed versions, lazily yielding each version id with
    /// the modification time of its metadata file. Unreadable entries are
    /// silently skipped.
    pub fn list_versions(&self) -> impl Iterator<Item = (String, SystemTime)> + '_ {
        fs::read_dir(&self.versions_dir)
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|entry| {
                let id = entry.file_name().into_string().ok()?;
                let mtime = entry.path()
                    .join_with_extension(&id, "json")
                    .metadata().ok()?
                    .modified().ok()?;
                Some((id, mtime))
            })
    }

}

/// Return the default main directory for Minecraft, so called ".minecraft".
pub fn default_main_dir() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        dirs::data_dir().map(|dir| dir.joined(".minecraft"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir().map(|dir| dir.joined("minecraft"))
    } else {
        dirs::home_dir().map(|dir| dir.joined(".minecraft"))
    }
}
