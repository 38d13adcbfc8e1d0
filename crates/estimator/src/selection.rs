//! Part selection table and the per-user estimate session.
//!
//! The table is keyed by canonical part name. Re-synchronizing it against the
//! chosen parts keeps every existing record verbatim, so user edits survive
//! re-selection and never leak to another part.

use serde::Serialize;

use crate::error::EstimateError;
use crate::headers::canonicalize;
use crate::model::CellValue;
use crate::numeric::safe_number;

/// One row of the part selection table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartRecord {
    pub part: String,
    /// Paint percentage applied to the schedule value, 0 to 100.
    pub discount_pct: f64,
    pub rnr: bool,
    /// Explicit R&R cost; 0 means unset.
    pub rnr_cost: f64,
    pub tinkering: bool,
    /// Explicit tinkering cost; 0 means unset.
    pub tinkering_cost: f64,
}

impl PartRecord {
    pub fn new(part: &str) -> Self {
        Self {
            part: canonicalize(part),
            discount_pct: 0.0,
            rnr: true,
            rnr_cost: 0.0,
            tinkering: true,
            tinkering_cost: 0.0,
        }
    }
}

/// Editable columns of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartColumn {
    Discount,
    Rnr,
    RnrCost,
    Tinkering,
    TinkeringCost,
}

impl std::str::FromStr for PartColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disc" | "disc%" | "discount" | "discount_pct" => Ok(Self::Discount),
            "rnr" | "r&r" | "r&r?" => Ok(Self::Rnr),
            "rnr_cost" | "r&r_cost" | "cost(optional)_r&r" => Ok(Self::RnrCost),
            "tinkering" | "tinkering?" => Ok(Self::Tinkering),
            "tinkering_cost" | "cost(optional)_tinkering" => Ok(Self::TinkeringCost),
            other => Err(format!(
                "unknown part column '{other}' (expected disc, rnr, rnr_cost, tinkering or tinkering_cost)"
            )),
        }
    }
}

/// Read a Yes/No cell. Only an explicit yes counts; anything else is No.
pub fn parse_flag(cell: &CellValue) -> bool {
    match cell {
        CellValue::Bool(b) => *b,
        CellValue::Number(n) => *n != 0.0,
        CellValue::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "yes" | "y" | "true" | "1"
        ),
        CellValue::Empty => false,
    }
}

fn percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn cost(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartTable {
    records: Vec<PartRecord>,
}

impl PartTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[PartRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, part: &str) -> Option<&PartRecord> {
        let key = canonicalize(part);
        self.records.iter().find(|r| r.part == key)
    }

    pub fn contains(&self, part: &str) -> bool {
        self.get(part).is_some()
    }

    /// Re-synchronize with the chosen parts: new parts get default records
    /// (appended in chosen order), unchosen parts are dropped, everything
    /// else is left untouched.
    pub fn sync<S: AsRef<str>>(&mut self, chosen: &[S]) {
        let chosen: Vec<String> = chosen
            .iter()
            .map(|p| canonicalize(p.as_ref()))
            .filter(|p| !p.is_empty())
            .collect();

        let before = self.records.len();
        self.records.retain(|r| chosen.contains(&r.part));
        let dropped = before - self.records.len();

        let mut added = 0;
        for part in &chosen {
            if self.add(part) {
                added += 1;
            }
        }

        if added > 0 || dropped > 0 {
            log::debug!("part table sync: {added} added, {dropped} dropped, {} total", self.records.len());
        }
    }

    /// Add a part with default values. Returns false if the name is blank or
    /// already present.
    pub fn add(&mut self, part: &str) -> bool {
        let key = canonicalize(part);
        if key.is_empty() || self.contains(&key) {
            return false;
        }
        self.records.push(PartRecord::new(&key));
        true
    }

    pub fn remove(&mut self, part: &str) -> Option<PartRecord> {
        let key = canonicalize(part);
        let idx = self.records.iter().position(|r| r.part == key)?;
        Some(self.records.remove(idx))
    }

    fn record_mut(&mut self, part: &str) -> Result<&mut PartRecord, EstimateError> {
        let key = canonicalize(part);
        self.records
            .iter_mut()
            .find(|r| r.part == key)
            .ok_or(EstimateError::UnknownPart(key))
    }

    pub fn set_discount(&mut self, part: &str, pct: f64) -> Result<(), EstimateError> {
        self.record_mut(part)?.discount_pct = percent(pct);
        Ok(())
    }

    pub fn set_rnr(&mut self, part: &str, enabled: bool) -> Result<(), EstimateError> {
        self.record_mut(part)?.rnr = enabled;
        Ok(())
    }

    pub fn set_rnr_cost(&mut self, part: &str, value: f64) -> Result<(), EstimateError> {
        self.record_mut(part)?.rnr_cost = cost(value);
        Ok(())
    }

    pub fn set_tinkering(&mut self, part: &str, enabled: bool) -> Result<(), EstimateError> {
        self.record_mut(part)?.tinkering = enabled;
        Ok(())
    }

    pub fn set_tinkering_cost(&mut self, part: &str, value: f64) -> Result<(), EstimateError> {
        self.record_mut(part)?.tinkering_cost = cost(value);
        Ok(())
    }

    /// Apply a raw cell edit. Numbers go through the safe parse, so a
    /// malformed value becomes 0 rather than an error; only an unknown part
    /// fails.
    pub fn apply_edit(
        &mut self,
        part: &str,
        column: PartColumn,
        value: &CellValue,
    ) -> Result<(), EstimateError> {
        match column {
            PartColumn::Discount => self.set_discount(part, safe_number(value)),
            PartColumn::Rnr => self.set_rnr(part, parse_flag(value)),
            PartColumn::RnrCost => self.set_rnr_cost(part, safe_number(value)),
            PartColumn::Tinkering => self.set_tinkering(part, parse_flag(value)),
            PartColumn::TinkeringCost => self.set_tinkering_cost(part, safe_number(value)),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Session-scoped selection state, passed explicitly into each pass.
///
/// `live` is what the user is editing. `confirm` copies it to `committed`;
/// computation is gated on the confirmation flag but always reads `live`.
#[derive(Debug, Clone, Default)]
pub struct EstimateSession {
    live: PartTable,
    committed: PartTable,
    confirmed: bool,
}

impl EstimateSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &PartTable {
        &self.live
    }

    pub fn table_mut(&mut self) -> &mut PartTable {
        &mut self.live
    }

    /// Last confirmed copy of the table.
    pub fn committed(&self) -> &PartTable {
        &self.committed
    }

    pub fn sync<S: AsRef<str>>(&mut self, chosen: &[S]) {
        self.live.sync(chosen);
    }

    pub fn confirm(&mut self) {
        self.committed = self.live.clone();
        self.confirmed = true;
    }

    pub fn revoke_confirmation(&mut self) {
        self.confirmed = false;
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Records to price in this pass.
    pub fn parts_for_estimate(&self) -> Result<Vec<&PartRecord>, EstimateError> {
        if !self.confirmed {
            return Err(EstimateError::NotConfirmed);
        }
        let parts: Vec<&PartRecord> = self
            .live
            .records()
            .iter()
            .filter(|r| !r.part.trim().is_empty())
            .collect();
        if parts.is_empty() {
            return Err(EstimateError::NoParts);
        }
        Ok(parts)
    }
}
