use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::error::EstimateError;
use crate::model::{
    ContextMatches, ReferenceRow, ReferenceTable, ReferenceTables, VehicleContext, VehicleSelection,
};

/// Option lists for each selection stage, given what has been picked so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionOptions {
    pub makers: Vec<String>,
    pub models: Vec<String>,
    pub years: Vec<String>,
    pub cities: Vec<String>,
    pub finishes: Vec<String>,
}

/// Selections made so far in the cascade.
#[derive(Debug, Clone, Default)]
pub struct PartialSelection {
    pub maker: Option<String>,
    pub model: Option<String>,
}

/// Build every option list at once. Models need a maker and years need a
/// model; without them those lists are empty.
pub fn cascade(tables: &ReferenceTables, partial: &PartialSelection) -> SelectionOptions {
    SelectionOptions {
        makers: maker_options(tables),
        models: partial
            .maker
            .as_deref()
            .map(|m| model_options(tables, m))
            .unwrap_or_default(),
        years: partial
            .model
            .as_deref()
            .map(|m| year_options(tables, m))
            .unwrap_or_default(),
        cities: city_options(tables),
        finishes: finish_options(tables),
    }
}

/// Makers present in either schedule, sorted.
pub fn maker_options(tables: &ReferenceTables) -> Vec<String> {
    distinct(schedule_rows(tables), |r| Some(&r.maker))
}

/// Models for `maker` across both schedules, sorted.
pub fn model_options(tables: &ReferenceTables, maker: &str) -> Vec<String> {
    distinct(schedule_rows(tables), |r| (r.maker == maker).then_some(&r.model))
}

/// Years for `model` across both schedules, most recent first.
pub fn year_options(tables: &ReferenceTables, model: &str) -> Vec<String> {
    let mut years = distinct(schedule_rows(tables), |r| (r.model == model).then_some(&r.year));
    years.sort_by(|a, b| year_order(b, a));
    years
}

/// Every city in either schedule. Not narrowed by earlier picks, so a city
/// missing from one schedule is still offered.
pub fn city_options(tables: &ReferenceTables) -> Vec<String> {
    distinct(schedule_rows(tables), |r| Some(&r.city))
}

/// Paint finishes, from the paint schedule only.
pub fn finish_options(tables: &ReferenceTables) -> Vec<String> {
    distinct(tables.paint.rows.iter(), |r| r.finish.as_ref())
}

/// Resolve the selection to one paint row and one labour row.
///
/// The first matching row wins when a schedule has duplicates; the match
/// counts are kept on the context so callers can report them.
pub fn resolve_context<'a>(
    tables: &'a ReferenceTables,
    selection: &VehicleSelection,
) -> Result<VehicleContext<'a>, EstimateError> {
    let (paint, paint_count) = first_match(&tables.paint, selection)?;
    let (labour, labour_count) = first_match(&tables.labour, selection)?;

    let matches = ContextMatches {
        paint: paint_count,
        labour: labour_count,
    };
    if matches.has_duplicates() {
        log::warn!(
            "duplicate schedule rows for {selection}: {} paint, {} labour; using the first of each",
            matches.paint,
            matches.labour,
        );
    }

    Ok(VehicleContext {
        paint,
        labour,
        matches,
    })
}

fn first_match<'a>(
    table: &'a ReferenceTable,
    selection: &VehicleSelection,
) -> Result<(&'a ReferenceRow, usize), EstimateError> {
    let mut hits = table.rows.iter().filter(|r| r.matches(selection));
    let first = hits.next().ok_or_else(|| EstimateError::NoMatchingContext {
        table: table.kind.to_string(),
        selection: selection.to_string(),
    })?;
    Ok((first, 1 + hits.count()))
}

fn schedule_rows(tables: &ReferenceTables) -> impl Iterator<Item = &ReferenceRow> {
    tables.paint.rows.iter().chain(tables.labour.rows.iter())
}

/// Sorted distinct non-blank values picked from rows.
fn distinct<'a, I, F>(rows: I, pick: F) -> Vec<String>
where
    I: Iterator<Item = &'a ReferenceRow>,
    F: Fn(&'a ReferenceRow) -> Option<&'a String>,
{
    let set: BTreeSet<&String> = rows.filter_map(pick).filter(|v| !v.is_empty()).collect();
    set.into_iter().cloned().collect()
}

/// Numeric years compare as numbers and rank above non-numeric labels.
fn year_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
