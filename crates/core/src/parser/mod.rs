//! Source extraction: turns source files into [`FunctionRecord`]s.
//!
//! Uses tree-sitter grammars for Python, C, C++, JavaScript and TypeScript.
//! Everything downstream (graph, change detection) only ever sees the
//! normalized records produced here.

mod extract;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::db::IndexConfig;
use crate::model::FunctionRecord;

/// Languages the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLanguage {
    Python,
    C,
    Cpp,
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
}

impl SourceLanguage {
    /// Detect the language from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "py" => Some(SourceLanguage::Python),
            "c" | "h" => Some(SourceLanguage::C),
            "cpp" | "cc" | "cxx" | "hpp" | "hxx" => Some(SourceLanguage::Cpp),
            "js" => Some(SourceLanguage::JavaScript),
            "jsx" => Some(SourceLanguage::Jsx),
            "ts" => Some(SourceLanguage::TypeScript),
            "tsx" => Some(SourceLanguage::Tsx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLanguage::Python => "python",
            SourceLanguage::C => "c",
            SourceLanguage::Cpp => "cpp",
            SourceLanguage::JavaScript => "javascript",
            SourceLanguage::Jsx => "jsx",
            SourceLanguage::TypeScript => "typescript",
            SourceLanguage::Tsx => "tsx",
        }
    }

    fn grammar(&self) -> tree_sitter::Language {
        match self {
            SourceLanguage::Python => tree_sitter_python::LANGUAGE.into(),
            SourceLanguage::C => tree_sitter_c::LANGUAGE.into(),
            SourceLanguage::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            SourceLanguage::JavaScript | SourceLanguage::Jsx => {
                tree_sitter_javascript::LANGUAGE.into()
            }
            SourceLanguage::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            SourceLanguage::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn is_script(&self) -> bool {
        matches!(
            self,
            SourceLanguage::JavaScript
                | SourceLanguage::Jsx
                | SourceLanguage::TypeScript
                | SourceLanguage::Tsx
        )
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unsupported source language for {0}")]
    UnsupportedLanguage(PathBuf),
    #[error("Failed to load the {language} grammar: {message}")]
    Grammar { language: SourceLanguage, message: String },
    #[error("Failed to walk {path}: {message}")]
    Walk { path: PathBuf, message: String },
}

/// Extract every named function from `source`.
///
/// `file_path` is copied verbatim into the records; pass the label the graph
/// should use (usually a root-relative path).
pub fn parse_source(
    source: &str,
    file_path: &str,
    language: SourceLanguage,
) -> Result<Vec<FunctionRecord>, ParseError> {
    let mut parser = tree_sitter::Parser::new();
    parser
        .set_language(&language.grammar())
        .map_err(|e| ParseError::Grammar { language, message: e.to_string() })?;

    let Some(tree) = parser.parse(source, None) else {
        warn!(file = file_path, "tree-sitter produced no tree");
        return Ok(Vec::new());
    };

    Ok(extract::functions(tree.root_node(), source, file_path, language))
}

/// Parse one file from disk, labelling records with `file_label`.
///
/// Missing files and unsupported extensions yield no records.
pub fn parse_file(path: &Path, file_label: &str) -> Result<Vec<FunctionRecord>, ParseError> {
    let Some(language) = SourceLanguage::from_path(path) else {
        return Ok(Vec::new());
    };
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let source = fs::read_to_string(path)
        .map_err(|source| ParseError::Io { path: path.to_path_buf(), source })?;
    parse_source(&source, file_label, language)
}

/// Walk `dir` and extract records from every supported file.
///
/// Files are visited in sorted order so the merged sequence (and therefore
/// edge resolution) is stable across runs. Records are labelled with their
/// path relative to `base` using `/` separators. Unreadable files and
/// directories below `dir` are skipped with a warning; only a failure to read
/// `dir` itself is an error.
pub fn collect_functions(
    dir: &Path,
    base: &Path,
    config: &IndexConfig,
) -> Result<Vec<FunctionRecord>, ParseError> {
    let mut records = Vec::new();
    let walker = WalkDir::new(dir).sort_by_file_name().into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !entry.file_type().is_dir()
            || !config.exclude_dirs.iter().any(|skip| entry.file_name() == skip.as_str())
    });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() > 0 => {
                let path = err.path().unwrap_or(dir).display().to_string();
                warn!(path = %path, error = %err, "skipping unreadable directory entry");
                continue;
            }
            Err(err) => {
                return Err(ParseError::Walk { path: dir.to_path_buf(), message: err.to_string() })
            }
        };
        if !entry.file_type().is_file() || SourceLanguage::from_path(entry.path()).is_none() {
            continue;
        }
        let label = file_label(entry.path(), base);
        match parse_file(entry.path(), &label) {
            Ok(found) => {
                debug!(file = %label, functions = found.len(), "extracted functions");
                records.extend(found);
            }
            Err(ParseError::Io { path, source }) => {
                warn!(path = %path.display(), error = %source, "skipping unreadable file");
            }
            Err(other) => return Err(other),
        }
    }

    Ok(records)
}

/// Path of `path` relative to `base` with forward slashes; falls back to the
/// full path when it is not under `base`.
pub fn file_label(path: &Path, base: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(rel) if rel.as_os_str().is_empty() => path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}
