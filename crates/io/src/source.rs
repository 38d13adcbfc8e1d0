//! Table sources: where the four reference sheets come from.
//!
//! A [`TableSource`] hands back raw cell grids. [`FileSource`] reads them
//! from CSV files or workbooks, [`CachedSource`] puts a staleness window in
//! front of any source, and [`load_reference_tables`] turns one snapshot of
//! all four into [`ReferenceTables`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use repairgrid_estimator::config::SourcesConfig;
use repairgrid_estimator::loader::load_tables;
use repairgrid_estimator::{CellValue, RawSheet, ReferenceTables};

use crate::csv::CellMode;
use crate::error::SourceError;

pub type Grid = Vec<Vec<CellValue>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    Paint,
    Labour,
    Tinkering,
    Rnr,
}

impl SheetKind {
    pub const ALL: [SheetKind; 4] = [Self::Paint, Self::Labour, Self::Tinkering, Self::Rnr];

    /// Paint sheets are self-describing records; the rest are raw grids.
    fn cell_mode(self) -> CellMode {
        match self {
            Self::Paint => CellMode::Typed,
            _ => CellMode::Text,
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paint => write!(f, "paint"),
            Self::Labour => write!(f, "labour"),
            Self::Tinkering => write!(f, "tinkering"),
            Self::Rnr => write!(f, "rnr"),
        }
    }
}

pub trait TableSource {
    fn fetch(&self, kind: SheetKind) -> Result<Grid, SourceError>;
}

// ---------------------------------------------------------------------------
// File source
// ---------------------------------------------------------------------------

/// One sheet location: a file, plus a worksheet name for workbooks
/// (`book.xlsx#Labour`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLocation {
    pub path: PathBuf,
    pub worksheet: Option<String>,
}

impl SheetLocation {
    /// Parse a configured location, resolving relative paths against `base`.
    pub fn parse(spec: &str, base: &Path) -> Self {
        let (file, worksheet) = match spec.rsplit_once('#') {
            Some((file, sheet)) if !sheet.trim().is_empty() => (file, Some(sheet.trim().to_string())),
            _ => (spec, None),
        };
        let file = Path::new(file.trim());
        let path = if file.is_absolute() {
            file.to_path_buf()
        } else {
            base.join(file)
        };
        Self { path, worksheet }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileSource {
    locations: HashMap<SheetKind, SheetLocation>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: SheetKind, location: SheetLocation) -> Self {
        self.locations.insert(kind, location);
        self
    }

    /// Source for an estimate config's `[sources]`, relative to `base_dir`
    /// (the directory holding the config file).
    pub fn from_config(sources: &SourcesConfig, base_dir: &Path) -> Self {
        Self::new()
            .with(SheetKind::Paint, SheetLocation::parse(&sources.paint, base_dir))
            .with(SheetKind::Labour, SheetLocation::parse(&sources.labour, base_dir))
            .with(SheetKind::Tinkering, SheetLocation::parse(&sources.tinkering, base_dir))
            .with(SheetKind::Rnr, SheetLocation::parse(&sources.rnr, base_dir))
    }

    /// Source for a directory laid out by convention: `paint.csv`,
    /// `labour.csv`, `tinkering.csv`, `rnr.csv`.
    pub fn from_dir(dir: &Path) -> Self {
        SheetKind::ALL.iter().fold(Self::new(), |source, &kind| {
            source.with(
                kind,
                SheetLocation {
                    path: dir.join(format!("{kind}.csv")),
                    worksheet: None,
                },
            )
        })
    }

    pub fn location(&self, kind: SheetKind) -> Option<&SheetLocation> {
        self.locations.get(&kind)
    }
}

impl TableSource for FileSource {
    fn fetch(&self, kind: SheetKind) -> Result<Grid, SourceError> {
        let location = self
            .locations
            .get(&kind)
            .ok_or_else(|| SourceError::MissingSource(kind.to_string()))?;

        log::debug!("reading {kind} sheet from {}", location.path.display());
        if crate::workbook::is_workbook(&location.path) {
            crate::workbook::read_grid(&location.path, location.worksheet.as_deref())
        } else {
            crate::csv::read_grid(&location.path, kind.cell_mode())
        }
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Serves repeated reads from memory until an entry is older than `ttl`.
///
/// Single-session, single-threaded: interior mutability via `RefCell`.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    entries: RefCell<HashMap<SheetKind, (Instant, Grid)>>,
}

impl<S: TableSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RefCell::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every cached sheet; the next fetch goes to the inner source.
    pub fn invalidate(&self) {
        self.entries.borrow_mut().clear();
    }

}

impl<S: TableSource> TableSource for CachedSource<S> {
    fn fetch(&self, kind: SheetKind) -> Result<Grid, SourceError> {
        if let Some((at, grid)) = self.entries.borrow().get(&kind) {
            if at.elapsed() < self.ttl {
                log::trace!("{kind} sheet served from cache");
                return Ok(grid.clone());
            }
        }

        let grid = self.inner.fetch(kind)?;
        self.entries
            .borrow_mut()
            .insert(kind, (Instant::now(), grid.clone()));
        Ok(grid)
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Fetch all four sheets and build one immutable snapshot of the tables.
pub fn load_reference_tables(source: &dyn TableSource) -> Result<ReferenceTables, SourceError> {
    let paint = RawSheet::from_grid(source.fetch(SheetKind::Paint)?);
    let labour = RawSheet::from_grid(source.fetch(SheetKind::Labour)?);
    let tinkering = source.fetch(SheetKind::Tinkering)?;
    let rnr = source.fetch(SheetKind::Rnr)?;
    Ok(load_tables(&paint, &labour, &tinkering, &rnr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use tempfile::tempdir;

    struct CountingSource {
        calls: Cell<usize>,
    }

    impl TableSource for CountingSource {
        fn fetch(&self, _kind: SheetKind) -> Result<Grid, SourceError> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![vec![CellValue::from(format!("call {}", self.calls.get()))]])
        }
    }

    fn counting() -> CountingSource {
        CountingSource { calls: Cell::new(0) }
    }

    fn write_sources(dir: &Path) {
        fs::write(
            dir.join("paint.csv"),
            "MAKER,MODEL,YEAR,CITY,W_METALLIC/SOLID,BONNET\nTOYOTA,COROLLA,2020,DELHI,SOLID,1000\n",
        )
        .unwrap();
        fs::write(
            dir.join("labour.csv"),
            "maker,model,year,city,bonnet,\nTOYOTA,COROLLA,2020,DELHI,5,\n,,,,,\n",
        )
        .unwrap();
        fs::write(dir.join("tinkering.csv"), "DOOR\n").unwrap();
        fs::write(dir.join("rnr.csv"), "bonnet\nBONNET\n").unwrap();
    }

    fn sources() -> SourcesConfig {
        SourcesConfig {
            paint: "paint.csv".into(),
            labour: "labour.csv".into(),
            tinkering: "tinkering.csv".into(),
            rnr: "rnr.csv".into(),
        }
    }

    #[test]
    fn location_parsing() {
        let base = Path::new("/data");
        assert_eq!(
            SheetLocation::parse("labour.csv", base),
            SheetLocation {
                path: PathBuf::from("/data/labour.csv"),
                worksheet: None,
            }
        );
        assert_eq!(
            SheetLocation::parse("book.xlsx#Labour ", base),
            SheetLocation {
                path: PathBuf::from("/data/book.xlsx"),
                worksheet: Some("Labour".into()),
            }
        );
        assert_eq!(SheetLocation::parse("/abs/p.csv#", base).path, PathBuf::from("/abs/p.csv#"));
    }

    #[test]
    fn loads_tables_from_csv_files() {
        let dir = tempdir().unwrap();
        write_sources(dir.path());

        let source = FileSource::from_config(&sources(), dir.path());
        let tables = load_reference_tables(&source).unwrap();

        assert_eq!(tables.paint.rows.len(), 1);
        assert_eq!(tables.paint.rows[0].value("BONNET"), 1000.0);
        assert_eq!(tables.labour.columns, vec!["MAKER", "MODEL", "YEAR", "CITY", "BONNET", "COL_5"]);
        assert_eq!(tables.labour.rows.len(), 1);
        assert_eq!(tables.labour.dropped_rows, 1);
        assert!(tables.rnr.contains("BONNET"));
        assert_eq!(tables.rnr.len(), 1);
        assert!(tables.tinkering.contains("door"));
    }

    #[test]
    fn directory_convention() {
        let dir = tempdir().unwrap();
        write_sources(dir.path());

        let source = FileSource::from_dir(dir.path());
        assert_eq!(
            source.location(SheetKind::Tinkering).unwrap().path,
            dir.path().join("tinkering.csv")
        );
        let tables = load_reference_tables(&source).unwrap();
        assert_eq!(tables.valid_parts(), vec!["BONNET", "COL_5"]);
    }

    #[test]
    fn missing_location_is_error() {
        let source = FileSource::new();
        let err = source.fetch(SheetKind::Labour).unwrap_err();
        assert_eq!(err, SourceError::MissingSource("labour".into()));
    }

    #[test]
    fn missing_file_fails_load() {
        let dir = tempdir().unwrap();
        let source = FileSource::from_config(&sources(), dir.path());
        let err = load_reference_tables(&source).unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[test]
    fn cache_serves_within_ttl() {
        let cached = CachedSource::new(counting(), Duration::from_secs(300));
        let first = cached.fetch(SheetKind::Paint).unwrap();
        let second = cached.fetch(SheetKind::Paint).unwrap();
        assert_eq!(first, second);
        assert_eq!(second[0][0], CellValue::from("call 1"));
        let labour = cached.fetch(SheetKind::Labour).unwrap();
        assert_eq!(labour[0][0], CellValue::from("call 2"));
        assert_eq!(cached.ttl(), Duration::from_secs(300));
    }

    #[test]
    fn cache_refetches_when_stale() {
        let cached = CachedSource::new(counting(), Duration::ZERO);
        cached.fetch(SheetKind::Paint).unwrap();
        let second = cached.fetch(SheetKind::Paint).unwrap();
        assert_eq!(second[0][0], CellValue::from("call 2"));
    }

    #[test]
    fn invalidate_clears_cache() {
        let cached = CachedSource::new(counting(), Duration::from_secs(300));
        cached.fetch(SheetKind::Rnr).unwrap();
        cached.invalidate();
        let refetched = cached.fetch(SheetKind::Rnr).unwrap();
        assert_eq!(refetched[0][0], CellValue::from("call 2"));
    }
}
