//! Filename to document identity parsing
//!
//! Editors that refuse to overwrite a file save `drawing(1).excalidraw`,
//! `drawing(2).excalidraw`, ... next to `drawing.excalidraw`. All of them are
//! variants of one logical document whose identity is the base name `drawing`.

use regex::Regex;

use crate::{Error, Result};

/// Logical identity of a file: base name plus optional variant ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentName {
    /// Identity shared by all variants of a document
    pub base: String,
    /// Ordinal from a trailing `(<n>)` suffix, if present
    pub version: Option<u64>,
}

impl DocumentName {
    pub fn new(base: impl Into<String>, version: Option<u64>) -> Self {
        Self {
            base: base.into(),
            version,
        }
    }

    /// Whether the base name is usable as a folder name.
    ///
    /// `...ext` and `..ext` parse to `..` and `.`, which would resolve to a
    /// parent or the same directory when joined onto a path.
    pub fn is_reconcilable(&self) -> bool {
        !matches!(self.base.as_str(), "." | "..")
    }

    /// Render the filename this identity parses from.
    pub fn file_name(&self, extension: &str) -> String {
        match self.version {
            Some(n) => format!("{}({}).{}", self.base, n, extension),
            None => format!("{}.{}", self.base, extension),
        }
    }
}

/// Parses filenames carrying one recognized extension.
///
/// Parsing is a pure function of the filename: no filesystem access.
#[derive(Debug, Clone)]
pub struct NameResolver {
    extension: String,
    suffix: String,
    pattern: Regex,
}

impl NameResolver {
    /// Create a resolver for `extension` (given without the leading dot).
    pub fn new(extension: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(Error::InvalidExtension {
                extension: extension.to_string(),
                message: "must be a non-empty file extension".into(),
            });
        }

        let pattern = Regex::new(&format!(
            r"^(.+?)(?:\((\d+)\))?\.{}$",
            regex::escape(extension)
        ))
        .map_err(|e| Error::InvalidExtension {
            extension: extension.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            extension: extension.to_string(),
            suffix: format!(".{}", extension),
            pattern,
        })
    }

    /// The recognized extension, without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether `file_name` ends in the recognized extension.
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.ends_with(&self.suffix)
    }

    /// Split a filename into base name and optional variant ordinal.
    ///
    /// `<base>(<digits>).<ext>` yields the ordinal; any other name ending in
    /// `.<ext>` yields the stripped name with no ordinal. Names without the
    /// extension come back unchanged.
    pub fn parse(&self, file_name: &str) -> DocumentName {
        if let Some(caps) = self.pattern.captures(file_name) {
            let base = &caps[1];
            match caps.get(2) {
                None => return DocumentName::new(base, None),
                Some(digits) => {
                    if let Ok(n) = digits.as_str().parse::<u64>() {
                        return DocumentName::new(base, Some(n));
                    }
                    // Ordinal overflow: keep the suffix as part of the identity
                }
            }
        }

        let base = file_name.strip_suffix(&self.suffix).unwrap_or(file_name);
        DocumentName::new(base, None)
    }

    /// Canonical filename for a base name.
    pub fn canonical_file_name(&self, base: &str) -> String {
        DocumentName::new(base, None).file_name(&self.extension)
    }
}
