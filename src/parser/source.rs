//! Where configuration text comes from
//!
//! Files are identified by the path string they were referenced by. A
//! provider turns that string into content, so the parser never touches the
//! file system directly.

use glob::Pattern;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Characters that make an include argument a glob pattern
pub const GLOB_CHARS: &[char] = &['*', '?', '['];

pub fn is_glob(path: &str) -> bool {
    path.contains(GLOB_CHARS)
}

pub trait SourceProvider {
    /// Full content of `path`
    fn read(&self, path: &str) -> io::Result<String>;

    fn exists(&self, path: &str) -> bool;

    /// Paths matching `pattern`, sorted
    fn expand(&self, pattern: &str) -> io::Result<Vec<String>>;
}

/// Reads from disk, resolving relative paths against an optional root
#[derive(Debug, Clone, Default)]
pub struct FsSource {
    root: Option<PathBuf>,
}

impl FsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl SourceProvider for FsSource {
    fn read(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.resolve(path))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn expand(&self, pattern: &str) -> io::Result<Vec<String>> {
        let resolved = self.resolve(pattern);
        let entries = glob::glob(&resolved.to_string_lossy())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;

        let mut matches = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            if !path.is_file() {
                continue;
            }
            // Hand back paths in the form they were asked for
            let shown = match &self.root {
                Some(root) if Path::new(pattern).is_relative() => {
                    path.strip_prefix(root).unwrap_or(path.as_path()).to_path_buf()
                }
                _ => path,
            };
            matches.push(shown.to_string_lossy().into_owned());
        }
        matches.sort();
        Ok(matches)
    }
}

/// In-memory file set, keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl SourceProvider for MemorySource {
    fn read(&self, path: &str) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such file: {path}"))
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn expand(&self, pattern: &str) -> io::Result<Vec<String>> {
        let pattern = Pattern::new(pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        // BTreeMap keys are already sorted
        Ok(self
            .files
            .keys()
            .filter(|path| pattern.matches(path))
            .cloned()
            .collect())
    }
}
