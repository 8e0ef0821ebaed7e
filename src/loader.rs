use crate::ast::TokenDocument;
use crate::error::ParserError;
use crate::parser::Parser;
use crate::utils::normalize_path;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// The capability to read a token source. Everything else in the pipeline is
/// pure; this is the only place file contents come from.
pub trait SourceLoader {
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Reads sources from the filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves sources from memory, keyed by normalised path.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, source: impl Into<String>) -> &mut Self {
        self.files
            .insert(normalize_path(path.as_ref()), source.into());
        self
    }

    #[must_use]
    pub fn with(mut self, path: impl AsRef<Path>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

/// Walks the import graph of one or more entry documents.
pub struct DocumentLoader<'a> {
    loader: &'a dyn SourceLoader,
    // Parsed documents by normalised path, in dependency order
    resolved_documents: IndexMap<PathBuf, TokenDocument>,
    // Files currently being loaded, to detect circular imports
    resolving_stack: Vec<PathBuf>,
}

impl<'a> DocumentLoader<'a> {
    pub fn new(loader: &'a dyn SourceLoader) -> Self {
        DocumentLoader {
            loader,
            resolved_documents: IndexMap::new(),
            resolving_stack: Vec::new(),
        }
    }

    /// Loads every entry and everything it imports. Imports come before the
    /// documents that import them and each file appears once.
    pub fn load_all(mut self, entries: &[PathBuf]) -> Result<Vec<TokenDocument>, ParserError> {
        for entry in entries {
            let path = normalize_path(entry);
            if self.resolved_documents.contains_key(&path) {
                continue;
            }
            let source = self
                .loader
                .load(&path)
                .map_err(|err| ParserError::ModuleNotFound {
                    file: path.to_string_lossy().to_string(),
                    import: path.to_string_lossy().to_string(),
                    reason: err.to_string(),
                })?;
            self.load_document(path, &source)?;
        }
        Ok(self.resolved_documents.into_values().collect())
    }

    fn load_document(&mut self, file_path: PathBuf, source_text: &str) -> Result<(), ParserError> {
        let document = Parser::new_with_name(source_text, file_path.clone()).parse_document()?;
        log::debug!(
            "parsed {} ({} tokens, {} imports)",
            file_path.display(),
            document.props.len(),
            document.imports.len()
        );

        self.resolving_stack.push(file_path.clone());
        let current_dir = file_path.parent().unwrap_or_else(|| Path::new(""));
        for import in &document.imports {
            let imported_path = normalize_path(&current_dir.join(import));
            if self.resolved_documents.contains_key(&imported_path) {
                continue;
            }
            if self.resolving_stack.contains(&imported_path) {
                return Err(self.circular_import(&imported_path));
            }
            let imported_source = self.loader.load(&imported_path).map_err(|err| {
                ParserError::ModuleNotFound {
                    file: file_path.to_string_lossy().to_string(),
                    import: import.clone(),
                    reason: err.to_string(),
                }
            })?;
            self.load_document(imported_path, &imported_source)?;
        }
        self.resolving_stack.pop();

        self.resolved_documents.insert(file_path, document);
        Ok(())
    }

    fn circular_import(&self, path: &PathBuf) -> ParserError {
        let cycle = self
            .resolving_stack
            .iter()
            .skip_while(|p| *p != path)
            .chain(std::iter::once(path))
            .map(|p| p.to_string_lossy().to_string())
            .collect::<Vec<String>>()
            .join(" -> ");
        ParserError::CircularImport { cycle }
    }
}

/// Loads `entries` and their imports through `loader`.
pub fn load_documents(
    entries: &[PathBuf],
    loader: &dyn SourceLoader,
) -> Result<Vec<TokenDocument>, ParserError> {
    DocumentLoader::new(loader).load_all(entries)
}
