//! Small path utilities, the installer joins a lot of paths.

use std::path::{Path, PathBuf};
use std::ffi::OsStr;


/// Extension to the standard [`Path`].
pub(crate) trait PathExt {

    /// Join a file name directly followed by a dotted extension, avoiding the
    /// temporary string that a `format!("{name}.{ext}")` join would need.
    fn join_with_extension<P: AsRef<Path>, S: AsRef<OsStr>>(&self, name: P, extension: S) -> PathBuf;

}

impl PathExt for Path {

    #[inline]
    fn join_with_extension<P: AsRef<Path>, S: AsRef<OsStr>>(&self, name: P, extension: S) -> PathBuf {
        self.join(name).appended(".").appended(extension)
    }

}

/// Extension to the standard [`PathBuf`] for by-value joining and raw appending.
pub(crate) trait PathBufExt {

    /// Return this path joined with another one, reusing the allocation.
    fn joined<P: AsRef<Path>>(self, path: P) -> Self;

    /// Return this path with a raw string appended, no separator is added.
    fn appended<S: AsRef<OsStr>>(self, s: S) -> Self;

}

impl PathBufExt for PathBuf {

    #[inline]
    fn joined<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.push(path);
        self
    }

    #[inline]
    fn appended<S: AsRef<OsStr>>(mut self, s: S) -> Self {
        self.as_mut_os_string().push(s);
        self
    }

}
