//! Source positions attached to tree nodes

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a node came from in the source text.
///
/// Compile errors and reflective queries (`reflect_pull('line_num')`) read
/// this. Nodes built without a position use [`Target::unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Target {
    /// 1-based line number (0 when unknown)
    pub line: u32,

    /// 1-based column number (0 when unknown)
    pub col: u32,

    /// The file the node was parsed from, if any
    pub file: Option<Arc<PathBuf>>,
}

impl Target {
    /// Create a target for a position in a file.
    pub fn new(line: u32, col: u32, file: Option<PathBuf>) -> Self {
        Self {
            line,
            col,
            file: file.map(Arc::new),
        }
    }

    /// A position with no file attached.
    pub fn at(line: u32, col: u32) -> Self {
        Self::new(line, col, None)
    }

    /// The unknown position.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// The file this target points into, if known.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref().map(PathBuf::as_path)
    }

    /// Whether this target carries no position information.
    pub fn is_unknown(&self) -> bool {
        self.line == 0 && self.col == 0 && self.file.is_none()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file() {
            Some(path) => write!(f, "{}:{}:{}", path.display(), self.line, self.col),
            None if self.is_unknown() => write!(f, "<unknown>"),
            None => write!(f, "line {}, col {}", self.line, self.col),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_without_file() {
        assert_eq!(Target::at(3, 7).to_string(), "line 3, col 7");
        assert_eq!(Target::unknown().to_string(), "<unknown>");
    }

    #[test]
    fn test_display_with_file() {
        let t = Target::new(1, 2, Some(PathBuf::from("main.ms")));
        assert_eq!(t.to_string(), "main.ms:1:2");
        assert_eq!(t.file(), Some(Path::new("main.ms")));
    }
}
