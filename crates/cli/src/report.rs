//! Human-readable rendering. Every function returns the text; callers decide
//! where it goes.

use std::fmt::Write as _;

use serde::Serialize;

use repairgrid_estimator::model::{ReferenceTable, ReferenceTables};
use repairgrid_estimator::resolver::SelectionOptions;
use repairgrid_estimator::{Estimate, PartRecord};

use crate::util::{display_width, format_amount, pad_left, pad_right};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Column widths fit the widest cell; a two-space gutter between columns.
fn render_table(columns: &[(&str, Align)], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, (title, _))| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| display_width(c))
                .chain(std::iter::once(display_width(title)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(columns)
            .zip(&widths)
            .map(|((cell, (_, align)), &w)| match align {
                Align::Left => pad_right(cell, w),
                Align::Right => pad_left(cell, w),
            })
            .collect();
        format!("  {}", padded.join("  ").trim_end())
    };

    let mut out = String::new();
    out.push_str(&line(columns.iter().map(|(t, _)| *t).collect()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn optional_cost(value: f64) -> String {
    if value == 0.0 {
        "-".to_string()
    } else {
        format_amount(value)
    }
}

// ---------------------------------------------------------------------------
// Estimate
// ---------------------------------------------------------------------------

pub fn part_table_text(records: &[PartRecord]) -> String {
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.part.clone(),
                format!("{:.2}", r.discount_pct),
                yes_no(r.rnr).to_string(),
                optional_cost(r.rnr_cost),
                yes_no(r.tinkering).to_string(),
                optional_cost(r.tinkering_cost),
            ]
        })
        .collect();
    render_table(
        &[
            ("Part", Align::Left),
            ("Disc %", Align::Right),
            ("R&R?", Align::Left),
            ("Cost R&R", Align::Right),
            ("Tinkering?", Align::Left),
            ("Cost Tinkering", Align::Right),
        ],
        &rows,
    )
}

pub fn estimate_text(estimate: &Estimate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Estimate: {} (garage {})", estimate.meta.name, estimate.meta.garage);
    let _ = writeln!(out, "Vehicle:  {}", estimate.vehicle);
    if estimate.matches.has_duplicates() {
        let _ = writeln!(
            out,
            "Note:     {} paint / {} labour rows matched; the first of each was used",
            estimate.matches.paint, estimate.matches.labour
        );
    }

    out.push_str("\nSelected parts\n");
    out.push_str(&part_table_text(&estimate.selected_parts));

    let rows: Vec<Vec<String>> = estimate
        .lines
        .iter()
        .map(|l| {
            vec![
                l.serial.to_string(),
                l.part.clone(),
                format_amount(l.rnr_cost),
                format_amount(l.tinkering_cost),
                format_amount(l.painting_cost),
                format!("{:.2}", l.discount_pct),
                format_amount(l.schedule_value),
            ]
        })
        .collect();
    out.push_str("\nFinal estimate\n");
    out.push_str(&render_table(
        &[
            ("S.No", Align::Right),
            ("Description", Align::Left),
            ("R&R", Align::Right),
            ("Tinkering", Align::Right),
            ("Painting", Align::Right),
            ("Disc %", Align::Right),
            ("Schedule", Align::Right),
        ],
        &rows,
    ));

    let s = &estimate.summary;
    let summary_rows = vec![
        vec![
            "Sub Total".to_string(),
            format_amount(s.rnr),
            format_amount(s.tinkering),
            format_amount(s.painting),
        ],
        vec![
            "Grand Total".to_string(),
            String::new(),
            String::new(),
            format_amount(s.display_grand_total()),
        ],
    ];
    out.push_str("\nSummary\n");
    out.push_str(&render_table(
        &[
            ("Description", Align::Left),
            ("R&R", Align::Right),
            ("Tinkering", Align::Right),
            ("Painting", Align::Right),
        ],
        &summary_rows,
    ));
    out
}

// ---------------------------------------------------------------------------
// Options + parts
// ---------------------------------------------------------------------------

pub fn options_text(options: &SelectionOptions) -> String {
    let mut out = String::new();
    for (label, values) in [
        ("Makers", &options.makers),
        ("Models", &options.models),
        ("Years", &options.years),
        ("Cities", &options.cities),
        ("Finishes", &options.finishes),
    ] {
        let shown = if values.is_empty() {
            "(none)".to_string()
        } else {
            values.join(", ")
        };
        let _ = writeln!(out, "{}{shown}", pad_right(&format!("{label}:"), 10));
    }
    out
}

pub fn parts_text(parts: &[String]) -> String {
    let mut out = String::new();
    for part in parts {
        let _ = writeln!(out, "{part}");
    }
    out
}

// ---------------------------------------------------------------------------
// Validate
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TableReport {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: usize,
    pub dropped_rows: usize,
    pub missing_columns: Vec<String>,
}

impl TableReport {
    fn from_table(table: &ReferenceTable) -> Self {
        Self {
            table: table.kind.to_string(),
            columns: table.columns.clone(),
            rows: table.rows.len(),
            dropped_rows: table.dropped_rows,
            missing_columns: table.missing_columns.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateReport {
    pub valid: bool,
    pub tables: Vec<TableReport>,
    pub valid_parts: usize,
    pub tinkering_parts: usize,
    pub rnr_parts: usize,
}

impl ValidateReport {
    pub fn from_tables(tables: &ReferenceTables) -> Self {
        Self {
            valid: tables.paint.is_usable() && tables.labour.is_usable(),
            tables: vec![
                TableReport::from_table(&tables.paint),
                TableReport::from_table(&tables.labour),
            ],
            valid_parts: tables.valid_parts().len(),
            tinkering_parts: tables.tinkering.len(),
            rnr_parts: tables.rnr.len(),
        }
    }
}

pub fn validate_text(report: &ValidateReport) -> String {
    let mut out = String::new();
    for t in &report.tables {
        let _ = writeln!(
            out,
            "{} table: {} row(s), {} blank row(s) dropped, {} column(s)",
            t.table,
            t.rows,
            t.dropped_rows,
            t.columns.len()
        );
        let _ = writeln!(out, "  columns: {}", t.columns.join(", "));
        if !t.missing_columns.is_empty() {
            let _ = writeln!(out, "  missing: {}", t.missing_columns.join(", "));
        }
    }
    let _ = writeln!(out, "valid parts: {}", report.valid_parts);
    let _ = writeln!(
        out,
        "eligibility: {} tinkering part(s), {} R&R part(s)",
        report.tinkering_parts, report.rnr_parts
    );
    out
}
