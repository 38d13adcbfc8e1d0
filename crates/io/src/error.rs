use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// File could not be opened or read.
    Io { path: PathBuf, message: String },
    /// Malformed CSV record.
    Csv { path: PathBuf, message: String },
    /// Workbook could not be opened, or the worksheet is missing.
    Workbook { path: PathBuf, message: String },
    /// No source configured for a sheet.
    MissingSource(String),
}

impl SourceError {
    pub fn io(path: &Path, err: impl fmt::Display) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn csv(path: &Path, err: impl fmt::Display) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn workbook(path: &Path, err: impl fmt::Display) -> Self {
        Self::Workbook {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Csv { path, message } => write!(f, "invalid CSV in {}: {message}", path.display()),
            Self::Workbook { path, message } => {
                write!(f, "cannot read workbook {}: {message}", path.display())
            }
            Self::MissingSource(sheet) => write!(f, "no source configured for the {sheet} sheet"),
        }
    }
}

impl std::error::Error for SourceError {}
