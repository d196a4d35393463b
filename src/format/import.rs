//! Resolution of the files side-loaded by `>>name` directives.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

/// The contents of an imported file
#[derive(Clone, Debug)]
pub struct ImportedSource {
    pub text: String,
    /// The base that imports nested inside this file are resolved against
    pub base: Option<PathBuf>,
}

/// Opens the files referenced by import directives
pub trait Importer {
    /// Open the file with the specified name, relative to the base of the importing file
    fn open(&self, base: Option<&Path>, name: &str) -> io::Result<ImportedSource>;
}

#[inline]
fn resolve(base: Option<&Path>, name: &str) -> PathBuf {
    match base {
        Some(base) => base.join(name),
        None => PathBuf::from(name)
    }
}

/// Resolves imports on the filesystem, relative to the directory of the importing file
#[derive(Copy, Clone, Debug, Default)]
pub struct FsImporter;
impl Importer for FsImporter {
    fn open(&self, base: Option<&Path>, name: &str) -> io::Result<ImportedSource> {
        let path = resolve(base, name);
        let text = fs::read_to_string(&path)?;
        Ok(ImportedSource { text, base: path.parent().map(Path::to_path_buf) })
    }
}

/// Resolves imports against a fixed set of named texts, like resources bundled into a binary
#[derive(Clone, Debug, Default)]
pub struct MemoryImporter {
    files: IndexMap<PathBuf, String>
}
impl MemoryImporter {
    #[inline]
    pub fn new() -> MemoryImporter {
        MemoryImporter::default()
    }
    /// Add a file, replacing any existing file with the same path
    #[inline]
    pub fn insert<P: Into<PathBuf>, T: Into<String>>(&mut self, path: P, text: T) {
        self.files.insert(path.into(), text.into());
    }
    #[inline]
    pub fn with_file<P: Into<PathBuf>, T: Into<String>>(mut self, path: P, text: T) -> MemoryImporter {
        self.insert(path, text);
        self
    }
}
impl Importer for MemoryImporter {
    fn open(&self, base: Option<&Path>, name: &str) -> io::Result<ImportedSource> {
        let path = resolve(base, name);
        match self.files.get(&path) {
            Some(text) => Ok(ImportedSource {
                text: text.clone(),
                base: path.parent().map(Path::to_path_buf)
            }),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Missing resource {}", path.display())
            ))
        }
    }
}
