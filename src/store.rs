//! Content store: the flat directory of recovered asset files
//!
//! The store keeps a naming table mirroring the directory so that collision
//! checks and texture lookups do not hit the filesystem for every query.
//! Names are held in a sorted set, which makes every "first match" rule in
//! this module deterministic regardless of directory iteration order.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SalvageError};
use crate::output::{is_partial_name, write_atomic};

/// How an atlas texture identifier was matched to a stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureBinding {
    /// A stored file whose stem equals the identifier
    Exact { entry: String },
    /// The first stored file (in name order) containing the identifier
    Partial {
        entry: String,
        /// How many other stored names also contain the identifier
        alternatives: usize,
    },
    /// Nothing in the store matches
    Unresolved,
}

impl TextureBinding {
    /// The bound entry name, if any.
    pub fn entry(&self) -> Option<&str> {
        match self {
            TextureBinding::Exact { entry } | TextureBinding::Partial { entry, .. } => Some(entry),
            TextureBinding::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, TextureBinding::Unresolved)
    }
}

/// A directory of recovered files with unique names.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    names: BTreeSet<String>,
}

impl ContentStore {
    /// Open a store rooted at `root`, creating the directory if needed and
    /// loading the names of files already present.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| SalvageError::io(format!("create {}", root.display()), e))?;

        let mut names = BTreeSet::new();
        let entries = fs::read_dir(&root)
            .map_err(|e| SalvageError::io(format!("list {}", root.display()), e))?;
        for entry in entries.flatten() {
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_file && !is_partial_name(&name) {
                names.insert(name);
            }
        }

        Ok(Self { root, names })
    }

    /// Store directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entry names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Whether an entry with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Path an entry lives at (whether or not it exists).
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Pick a name for a new entry that does not collide with any existing one.
    ///
    /// `name` is used as-is when free. Otherwise it becomes `{counter}_{name}`,
    /// and if that is taken too, `{counter}_{n}_{name}` for the smallest free
    /// `n >= 1`.
    pub fn unique_name(&self, name: &str, counter: usize) -> String {
        if !self.contains(name) {
            return name.to_string();
        }
        let prefixed = format!("{}_{}", counter, name);
        if !self.contains(&prefixed) {
            return prefixed;
        }
        (1..)
            .map(|n| format!("{}_{}_{}", counter, n, name))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or(prefixed)
    }

    /// Write a new entry and record its name. Returns the written path.
    pub fn write(&mut self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_of(name);
        write_atomic(&path, bytes)?;
        self.names.insert(name.to_string());
        Ok(path)
    }

    /// Read an entry's bytes.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        if !self.contains(name) {
            return Err(SalvageError::MissingResource(format!(
                "'{}' not found in {}",
                name,
                self.root.display()
            )));
        }
        let path = self.path_of(name);
        fs::read(&path).map_err(|e| SalvageError::io(format!("read {}", path.display()), e))
    }

    /// Match a texture identifier (hash or GUID) to a stored file.
    ///
    /// An entry whose stem equals the identifier wins outright. Otherwise the
    /// first entry in name order that contains the identifier is used.
    pub fn bind_texture(&self, texture_id: &str) -> TextureBinding {
        if texture_id.is_empty() {
            return TextureBinding::Unresolved;
        }

        if let Some(exact) = self.names.iter().find(|n| file_stem(n) == texture_id) {
            return TextureBinding::Exact { entry: exact.clone() };
        }

        let mut candidates = self.names.iter().filter(|n| n.contains(texture_id));
        match candidates.next() {
            Some(first) => {
                let alternatives = candidates.count();
                if alternatives > 0 {
                    log::debug!(
                        "texture {} matched {} entries, using {}",
                        texture_id,
                        alternatives + 1,
                        first
                    );
                }
                TextureBinding::Partial { entry: first.clone(), alternatives }
            }
            None => TextureBinding::Unresolved,
        }
    }

    /// Resolve a texture reference that may be either a stored file name or
    /// a bare texture identifier.
    pub fn resolve_reference(&self, reference: &str) -> TextureBinding {
        if self.contains(reference) {
            return TextureBinding::Exact { entry: reference.to_string() };
        }
        self.bind_texture(file_stem(reference))
    }
}

fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}
