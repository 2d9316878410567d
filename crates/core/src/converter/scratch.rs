//! Scoped scratch space for converter output files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::warn;

use crate::error::{Error, Result};

/// A payload read from converter output, together with the outcome of
/// removing the files it was read from.
///
/// Cleanup runs only after the payload has been captured, so a failed
/// removal never replaces the result; it is reported in `cleanup` instead.
#[derive(Debug)]
pub struct Converted<T> {
    pub value: T,
    pub cleanup: Option<Error>,
}

impl<T> Converted<T> {
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Turn a cleanup failure into a hard error.
    pub fn strict(self) -> Result<T> {
        match self.cleanup {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

/// Temporary directory named after the converted document.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a directory in the system temp dir, prefixed with `source`
    /// (path separators replaced).
    pub fn for_source(source: &Path) -> Result<Self> {
        let prefix = format!("{}-", source.to_string_lossy().replace(['/', '\\'], "_"));
        let dir = tempfile::Builder::new().prefix(&prefix).tempdir()?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Prefix handed to `pdftohtml`; it appends `.xml` / `.html` itself.
    pub fn output_prefix(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    /// Remove `files` and then the directory. All steps are attempted; the
    /// first failure is logged and returned.
    pub fn finish<T>(self, value: T, files: &[&Path]) -> Converted<T> {
        let mut cleanup = None;
        for file in files {
            if let Err(err) = remove_if_exists(file) {
                cleanup.get_or_insert(err);
            }
        }
        let dir_path = self.dir.path().to_path_buf();
        if let Err(source) = self.dir.close() {
            cleanup.get_or_insert(Error::Cleanup {
                path: dir_path,
                source,
            });
        }
        if let Some(err) = &cleanup {
            warn!(error = %err, "scratch cleanup failed");
        }
        Converted { value, cleanup }
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(Error::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}
