use crate::config::CategoryRates;
use crate::headers::canonicalize;
use crate::model::{CostLine, CostSummary, PartSet, VehicleContext};
use crate::selection::PartRecord;

/// Eligibility sets for the two fallback-priced categories.
#[derive(Debug, Clone, Copy)]
pub struct Eligibility<'a> {
    pub tinkering: &'a PartSet,
    pub rnr: &'a PartSet,
}

/// Price one category. Precedence: disabled → 0, explicit override, then
/// the labour base value times the category rate for eligible parts, else 0.
pub fn category_cost(enabled: bool, override_cost: f64, eligible: bool, base_value: f64, rate: f64) -> f64 {
    if !enabled {
        return 0.0;
    }
    if override_cost != 0.0 {
        return override_cost;
    }
    if eligible {
        base_value * rate
    } else {
        0.0
    }
}

/// Cost one part against the resolved vehicle context.
pub fn cost_line(
    serial: usize,
    record: &PartRecord,
    ctx: &VehicleContext<'_>,
    eligibility: Eligibility<'_>,
    rates: &CategoryRates,
) -> CostLine {
    let part = canonicalize(&record.part);
    let schedule_value = ctx.paint.value(&part);
    let base_value = ctx.labour.value(&part);

    CostLine {
        serial,
        rnr_cost: category_cost(
            record.rnr,
            record.rnr_cost,
            eligibility.rnr.contains(&part),
            base_value,
            rates.rnr,
        ),
        tinkering_cost: category_cost(
            record.tinkering,
            record.tinkering_cost,
            eligibility.tinkering.contains(&part),
            base_value,
            rates.tinkering,
        ),
        painting_cost: schedule_value * (record.discount_pct / 100.0),
        discount_pct: record.discount_pct,
        schedule_value,
        part,
    }
}

/// Cost every part and accumulate sub totals at full precision.
pub fn calculate(
    ctx: &VehicleContext<'_>,
    parts: &[&PartRecord],
    eligibility: Eligibility<'_>,
    rates: &CategoryRates,
) -> (Vec<CostLine>, CostSummary) {
    let mut summary = CostSummary::default();
    let lines: Vec<CostLine> = parts
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let line = cost_line(i + 1, record, ctx, eligibility, rates);
            summary.add(&line);
            line
        })
        .collect();
    (lines, summary)
}
