use crate::calculator::{calculate, Eligibility};
use crate::config::CategoryRates;
use crate::error::EstimateError;
use crate::model::{Estimate, EstimateMeta, GarageType, ReferenceTables, VehicleSelection};
use crate::resolver::resolve_context;
use crate::selection::EstimateSession;

/// Everything a pass needs besides the tables and the session.
#[derive(Debug, Clone)]
pub struct EstimateRequest {
    pub name: String,
    pub selection: VehicleSelection,
    pub garage: GarageType,
    pub rates: CategoryRates,
}

/// Run one computation pass: gate on confirmation, resolve the vehicle
/// context, price every selected part.
///
/// Tables are read, never mutated; each call is independent of the last.
pub fn run(
    request: &EstimateRequest,
    tables: &ReferenceTables,
    session: &EstimateSession,
) -> Result<Estimate, EstimateError> {
    let parts = session.parts_for_estimate()?;
    let ctx = resolve_context(tables, &request.selection)?;

    let eligibility = Eligibility {
        tinkering: &tables.tinkering,
        rnr: &tables.rnr,
    };
    let (lines, summary) = calculate(&ctx, &parts, eligibility, &request.rates);

    log::info!(
        "estimate '{}': {} part(s) for {}, grand total {:.2}",
        request.name,
        lines.len(),
        request.selection,
        summary.display_grand_total(),
    );

    Ok(Estimate {
        meta: EstimateMeta {
            name: request.name.clone(),
            garage: request.garage,
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        vehicle: request.selection.clone(),
        matches: ctx.matches,
        selected_parts: parts.into_iter().cloned().collect(),
        lines,
        summary,
    })
}
