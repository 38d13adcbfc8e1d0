//! `repairgrid-estimator`: vehicle repair cost reconciliation engine.
//!
//! Pure engine crate: receives raw sheets from a data source, normalizes them
//! into reference tables, resolves the vehicle context and prices the user's
//! part selection. No CLI or IO dependencies.

pub mod calculator;
pub mod config;
pub mod engine;
pub mod error;
pub mod headers;
pub mod loader;
pub mod model;
pub mod numeric;
pub mod resolver;
pub mod selection;

pub use config::{CategoryRates, EstimateConfig};
pub use engine::{run, EstimateRequest};
pub use error::EstimateError;
pub use model::{CellValue, Estimate, RawSheet, ReferenceTables, VehicleSelection};
pub use selection::{EstimateSession, PartRecord, PartTable};
