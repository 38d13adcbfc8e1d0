use std::collections::HashSet;

use serde::Deserialize;

use crate::engine::EstimateRequest;
use crate::error::EstimateError;
use crate::headers::canonicalize;
use crate::loader::coerce_year;
use crate::model::{CellValue, GarageType, VehicleSelection};
use crate::selection::{EstimateSession, PartColumn};

/// Fallback rate for tinkering: labour base value × rate.
pub const DEFAULT_TINKERING_RATE: f64 = 3300.0;
/// Fallback rate for removal & reinstallation. Same default as tinkering,
/// configured separately.
pub const DEFAULT_RNR_RATE: f64 = 3300.0;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EstimateConfig {
    pub name: String,
    pub sources: SourcesConfig,
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub rates: Option<CategoryRates>,
    /// Parts and costs confirmed; without it nothing is computed.
    #[serde(default)]
    pub confirm: bool,
    #[serde(default)]
    pub parts: Vec<PartInput>,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Paths of the four reference sheets, relative to the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    pub paint: String,
    pub labour: String,
    pub tinkering: String,
    pub rnr: String,
}

impl SourcesConfig {
    /// Read only the `[sources]` table of a config, ignoring everything else.
    /// Used by commands that browse the tables before a vehicle is chosen.
    pub fn from_toml(input: &str) -> Result<Self, EstimateError> {
        #[derive(Deserialize)]
        struct SourcesProbe {
            sources: SourcesConfig,
        }

        let probe: SourcesProbe =
            toml::from_str(input).map_err(|e| EstimateError::ConfigParse(e.to_string()))?;
        probe.sources.validate()?;
        Ok(probe.sources)
    }

    pub fn validate(&self) -> Result<(), EstimateError> {
        for (name, path) in [
            ("paint", &self.paint),
            ("labour", &self.labour),
            ("tinkering", &self.tinkering),
            ("rnr", &self.rnr),
        ] {
            if path.trim().is_empty() {
                return Err(EstimateError::ConfigValidation(format!(
                    "sources.{name} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleConfig {
    pub maker: String,
    pub model: String,
    /// Text or number; compared as text.
    pub year: CellValue,
    pub city: String,
    pub finish: String,
    #[serde(default)]
    pub garage: GarageType,
}

impl VehicleConfig {
    pub fn selection(&self) -> VehicleSelection {
        VehicleSelection {
            maker: self.maker.trim().to_string(),
            model: self.model.trim().to_string(),
            year: coerce_year(&self.year),
            city: self.city.trim().to_string(),
            finish: self.finish.trim().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Category rates applied to the labour base value when a part has no
/// explicit cost.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CategoryRates {
    #[serde(default = "default_tinkering_rate")]
    pub tinkering: f64,
    #[serde(default = "default_rnr_rate")]
    pub rnr: f64,
}

fn default_tinkering_rate() -> f64 {
    DEFAULT_TINKERING_RATE
}

fn default_rnr_rate() -> f64 {
    DEFAULT_RNR_RATE
}

impl Default for CategoryRates {
    fn default() -> Self {
        Self {
            tinkering: DEFAULT_TINKERING_RATE,
            rnr: DEFAULT_RNR_RATE,
        }
    }
}

impl CategoryRates {
    pub fn validate(&self) -> Result<(), EstimateError> {
        for (name, rate) in [("tinkering", self.tinkering), ("rnr", self.rnr)] {
            if !rate.is_finite() || rate < 0.0 {
                return Err(EstimateError::ConfigValidation(format!(
                    "rates.{name} must be a non-negative number, got {rate}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parts + Output
// ---------------------------------------------------------------------------

/// A chosen part and the user's edits to its row. Values are raw cells and
/// go through the same lenient parsing as interactive edits.
#[derive(Debug, Clone, Deserialize)]
pub struct PartInput {
    pub part: String,
    #[serde(default)]
    pub disc: Option<CellValue>,
    #[serde(default)]
    pub rnr: Option<CellValue>,
    #[serde(default)]
    pub rnr_cost: Option<CellValue>,
    #[serde(default)]
    pub tinkering: Option<CellValue>,
    #[serde(default)]
    pub tinkering_cost: Option<CellValue>,
}

impl PartInput {
    fn edits(&self) -> impl Iterator<Item = (PartColumn, &CellValue)> {
        [
            (PartColumn::Discount, self.disc.as_ref()),
            (PartColumn::Rnr, self.rnr.as_ref()),
            (PartColumn::RnrCost, self.rnr_cost.as_ref()),
            (PartColumn::Tinkering, self.tinkering.as_ref()),
            (PartColumn::TinkeringCost, self.tinkering_cost.as_ref()),
        ]
        .into_iter()
        .filter_map(|(col, value)| value.map(|v| (col, v)))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl EstimateConfig {
    pub fn from_toml(input: &str) -> Result<Self, EstimateError> {
        let config: EstimateConfig =
            toml::from_str(input).map_err(|e| EstimateError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EstimateError> {
        if self.name.trim().is_empty() {
            return Err(EstimateError::ConfigValidation("name must not be empty".into()));
        }

        self.sources.validate()?;

        let selection = self.vehicle.selection();
        for (field, value) in [
            ("maker", &selection.maker),
            ("model", &selection.model),
            ("year", &selection.year),
            ("city", &selection.city),
            ("finish", &selection.finish),
        ] {
            if value.is_empty() {
                return Err(EstimateError::ConfigValidation(format!(
                    "vehicle.{field} must not be empty"
                )));
            }
        }

        if let Some(ref rates) = self.rates {
            rates.validate()?;
        }

        let mut seen = HashSet::new();
        for input in &self.parts {
            let part = canonicalize(&input.part);
            if part.is_empty() {
                return Err(EstimateError::ConfigValidation("part name must not be empty".into()));
            }
            if !seen.insert(part.clone()) {
                return Err(EstimateError::ConfigValidation(format!(
                    "part '{part}' listed more than once"
                )));
            }
        }

        Ok(())
    }

    /// Chosen part names in config order.
    pub fn chosen_parts(&self) -> Vec<String> {
        self.parts.iter().map(|p| canonicalize(&p.part)).collect()
    }

    /// Build the pass request. `[rates]` in the config wins over the
    /// caller's defaults (usually the user settings).
    pub fn request(&self, default_rates: CategoryRates) -> EstimateRequest {
        EstimateRequest {
            name: self.name.clone(),
            selection: self.vehicle.selection(),
            garage: self.vehicle.garage,
            rates: self.rates.unwrap_or(default_rates),
        }
    }

    /// Replay the config into a session: sync the chosen parts, apply each
    /// part's edits, confirm if requested.
    pub fn apply_to(&self, session: &mut EstimateSession) -> Result<(), EstimateError> {
        session.sync(&self.chosen_parts());
        for input in &self.parts {
            for (column, value) in input.edits() {
                session.table_mut().apply_edit(&input.part, column, value)?;
            }
        }
        if self.confirm {
            session.confirm();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
