use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::headers::canonicalize;
use crate::numeric::{round2, safe_number, serialize_round2};
use crate::selection::PartRecord;

pub const MAKER: &str = "MAKER";
pub const MODEL: &str = "MODEL";
pub const YEAR: &str = "YEAR";
pub const CITY: &str = "CITY";
/// Paint finish column, paint schedule only.
pub const FINISH: &str = "W_METALLIC/SOLID";

/// Columns every schedule row is keyed by.
pub const IDENTITY_COLUMNS: [&str; 4] = [MAKER, MODEL, YEAR, CITY];

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// A single cell as delivered by the data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) | Self::Bool(_) => false,
        }
    }

    /// Trimmed text form. Integral numbers render without a fraction so
    /// `2020.0` and `"2020"` compare equal.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(n) => format_number(*n),
            Self::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A sheet as read from the source: header row plus data rows.
/// Rows may be ragged; the loader pads or truncates them to the header width.
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawSheet {
    /// Split a grid whose first row holds the headers.
    pub fn from_grid(mut grid: Vec<Vec<CellValue>>) -> Self {
        if grid.is_empty() {
            return Self::default();
        }
        let rows = grid.split_off(1);
        let headers = grid
            .pop()
            .unwrap_or_default()
            .iter()
            .map(|c| match c {
                CellValue::Text(s) => s.clone(),
                other => other.to_text(),
            })
            .collect();
        Self { headers, rows }
    }
}

// ---------------------------------------------------------------------------
// Reference tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Paint,
    Labour,
}

impl ScheduleKind {
    /// Identity columns a table of this kind must carry to be usable.
    pub fn required_columns(&self) -> Vec<&'static str> {
        match self {
            Self::Paint => vec![MAKER, MODEL, YEAR, CITY, FINISH],
            Self::Labour => IDENTITY_COLUMNS.to_vec(),
        }
    }
}

impl std::fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paint => write!(f, "paint"),
            Self::Labour => write!(f, "labour"),
        }
    }
}

/// One schedule row: the identity contract plus part-keyed cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRow {
    pub maker: String,
    pub model: String,
    pub year: String,
    pub city: String,
    /// Paint finish; `None` for labour rows.
    pub finish: Option<String>,
    pub parts: BTreeMap<String, CellValue>,
}

impl ReferenceRow {
    /// Numeric value of a part column, `0.0` if absent or unparseable.
    pub fn value(&self, part: &str) -> f64 {
        self.parts.get(part).map(safe_number).unwrap_or(0.0)
    }

    pub fn matches(&self, selection: &VehicleSelection) -> bool {
        self.maker == selection.maker
            && self.model == selection.model
            && self.year == selection.year
            && self.city == selection.city
            && self.finish.as_ref().map_or(true, |f| *f == selection.finish)
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceTable {
    pub kind: ScheduleKind,
    /// Canonical column names, unique, in source order.
    pub columns: Vec<String>,
    pub rows: Vec<ReferenceRow>,
    /// Required identity columns the source did not provide. Non-empty means
    /// `rows` is empty and every option list built from this table is too.
    pub missing_columns: Vec<String>,
    /// Fully blank rows removed at load time.
    pub dropped_rows: usize,
}

impl ReferenceTable {
    pub fn empty(kind: ScheduleKind) -> Self {
        Self {
            kind,
            columns: Vec::new(),
            rows: Vec::new(),
            missing_columns: Vec::new(),
            dropped_rows: 0,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.missing_columns.is_empty()
    }

    /// Columns that are part names (everything but the identity contract).
    pub fn part_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| !IDENTITY_COLUMNS.contains(c) && *c != FINISH)
    }
}

/// Canonical part names eligible for a category's fallback cost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartSet(BTreeSet<String>);

impl PartSet {
    pub fn contains(&self, part: &str) -> bool {
        self.0.contains(&canonicalize(part))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for PartSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|s| canonicalize(s.as_ref()))
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

/// The four tables one computation pass reads from.
#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub paint: ReferenceTable,
    pub labour: ReferenceTable,
    pub tinkering: PartSet,
    pub rnr: PartSet,
}

impl ReferenceTables {
    /// Parts offered for selection: labour columns minus the identity columns,
    /// sorted and deduplicated.
    pub fn valid_parts(&self) -> Vec<String> {
        let parts: BTreeSet<&str> = self.labour.part_columns().collect();
        parts.into_iter().map(str::to_string).collect()
    }
}

// ---------------------------------------------------------------------------
// Vehicle selection + context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleSelection {
    pub maker: String,
    pub model: String,
    pub year: String,
    pub city: String,
    pub finish: String,
}

impl std::fmt::Display for VehicleSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} in {}, {}",
            self.maker, self.model, self.year, self.city, self.finish
        )
    }
}

/// Garage category. Accepted and echoed, not priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GarageType {
    #[default]
    A,
    B,
    C,
    D,
}

impl std::str::FromStr for GarageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            other => Err(format!("unknown garage type '{other}' (expected A, B, C or D)")),
        }
    }
}

impl std::fmt::Display for GarageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
            Self::C => write!(f, "C"),
            Self::D => write!(f, "D"),
        }
    }
}

/// The resolved paint and labour rows for one pass.
#[derive(Debug, Clone)]
pub struct VehicleContext<'a> {
    pub paint: &'a ReferenceRow,
    pub labour: &'a ReferenceRow,
    pub matches: ContextMatches,
}

/// How many rows each filter matched before first-row-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContextMatches {
    pub paint: usize,
    pub labour: usize,
}

impl ContextMatches {
    pub fn has_duplicates(&self) -> bool {
        self.paint > 1 || self.labour > 1
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostLine {
    /// 1-based line number.
    pub serial: usize,
    pub part: String,
    #[serde(serialize_with = "serialize_round2")]
    pub rnr_cost: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub tinkering_cost: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub painting_cost: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub discount_pct: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub schedule_value: f64,
}

/// Category sub totals at full precision.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostSummary {
    pub rnr: f64,
    pub tinkering: f64,
    pub painting: f64,
}

impl CostSummary {
    pub fn add(&mut self, line: &CostLine) {
        self.rnr += line.rnr_cost;
        self.tinkering += line.tinkering_cost;
        self.painting += line.painting_cost;
    }

    pub fn grand_total(&self) -> f64 {
        self.rnr + self.tinkering + self.painting
    }

    /// Grand total as printed: the sum of the three printed sub totals, so
    /// the summary always adds up on paper.
    pub fn display_grand_total(&self) -> f64 {
        round2(round2(self.rnr) + round2(self.tinkering) + round2(self.painting))
    }
}

impl Serialize for CostSummary {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("CostSummary", 4)?;
        s.serialize_field("rnr", &round2(self.rnr))?;
        s.serialize_field("tinkering", &round2(self.tinkering))?;
        s.serialize_field("painting", &round2(self.painting))?;
        s.serialize_field("grand_total", &self.display_grand_total())?;
        s.end()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EstimateMeta {
    pub name: String,
    pub garage: GarageType,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Estimate {
    pub meta: EstimateMeta,
    pub vehicle: VehicleSelection,
    pub matches: ContextMatches,
    pub selected_parts: Vec<PartRecord>,
    pub lines: Vec<CostLine>,
    pub summary: CostSummary,
}
