use std::collections::BTreeMap;

use crate::headers::normalize_headers;
use crate::model::{
    CellValue, PartSet, RawSheet, ReferenceRow, ReferenceTable, ReferenceTables, ScheduleKind,
    CITY, FINISH, MAKER, MODEL, YEAR,
};

/// Load the labour schedule. Labour sheets are the least disciplined source,
/// so headers go through the normalizer before any row is built.
pub fn load_labour(sheet: &RawSheet) -> ReferenceTable {
    load_schedule(ScheduleKind::Labour, sheet)
}

/// Load the paint schedule from self-describing records; only the resulting
/// column names are normalized.
pub fn load_paint(sheet: &RawSheet) -> ReferenceTable {
    load_schedule(ScheduleKind::Paint, sheet)
}

/// Build an eligibility set from the first column of every row.
/// The source has no header row; every non-blank first cell is a part name.
pub fn load_part_set(grid: &[Vec<CellValue>]) -> PartSet {
    grid.iter()
        .filter_map(|row| row.first())
        .filter(|cell| !cell.is_blank())
        .map(CellValue::to_text)
        .collect()
}

/// Load all four tables for one pass.
pub fn load_tables(
    paint: &RawSheet,
    labour: &RawSheet,
    tinkering: &[Vec<CellValue>],
    rnr: &[Vec<CellValue>],
) -> ReferenceTables {
    let tables = ReferenceTables {
        paint: load_paint(paint),
        labour: load_labour(labour),
        tinkering: load_part_set(tinkering),
        rnr: load_part_set(rnr),
    };
    log::debug!(
        "loaded tables: paint {} rows, labour {} rows ({} columns), tinkering {} parts, r&r {} parts",
        tables.paint.rows.len(),
        tables.labour.rows.len(),
        tables.labour.columns.len(),
        tables.tinkering.len(),
        tables.rnr.len(),
    );
    tables
}

/// YEAR as exact-match text: integral numbers lose their fraction, numeric
/// text like `"2020.0"` is treated the same way.
pub fn coerce_year(cell: &CellValue) -> String {
    match cell {
        CellValue::Text(s) => {
            let trimmed = s.trim();
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() && n.fract() == 0.0 => CellValue::Number(n).to_text(),
                _ => trimmed.to_string(),
            }
        }
        other => other.to_text(),
    }
}

fn load_schedule(kind: ScheduleKind, sheet: &RawSheet) -> ReferenceTable {
    let columns = normalize_headers(&sheet.headers);

    let index: BTreeMap<&str, usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let missing_columns: Vec<String> = kind
        .required_columns()
        .into_iter()
        .filter(|c| !index.contains_key(c))
        .map(str::to_string)
        .collect();

    let mut table = ReferenceTable::empty(kind);

    let non_blank: Vec<&Vec<CellValue>> = sheet
        .rows
        .iter()
        .filter(|row| !row.iter().all(CellValue::is_blank))
        .collect();
    table.dropped_rows = sheet.rows.len() - non_blank.len();

    if !missing_columns.is_empty() {
        log::warn!(
            "{kind} table is missing column(s) {}; its rows are unusable",
            missing_columns.join(", ")
        );
        table.columns = columns;
        table.missing_columns = missing_columns;
        return table;
    }

    let cell = |row: &[CellValue], col: &str| -> CellValue {
        index
            .get(col)
            .and_then(|&i| row.get(i))
            .cloned()
            .unwrap_or_default()
    };

    for row in non_blank {
        let row: &[CellValue] = row;
        let parts: BTreeMap<String, CellValue> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| !matches!(c.as_str(), MAKER | MODEL | YEAR | CITY | FINISH))
            .map(|(i, c)| (c.clone(), row.get(i).cloned().unwrap_or_default()))
            .collect();

        table.rows.push(ReferenceRow {
            maker: cell(row, MAKER).to_text(),
            model: cell(row, MODEL).to_text(),
            year: coerce_year(&cell(row, YEAR)),
            city: cell(row, CITY).to_text(),
            finish: match kind {
                ScheduleKind::Paint => Some(cell(row, FINISH).to_text()),
                ScheduleKind::Labour => None,
            },
            parts,
        });
    }

    if table.dropped_rows > 0 {
        log::debug!("{kind} table: dropped {} blank row(s)", table.dropped_rows);
    }

    table.columns = columns;
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    fn labour_sheet() -> RawSheet {
        RawSheet {
            headers: vec![
                " maker".into(),
                "Model".into(),
                "YEAR".into(),
                "city ".into(),
                "bonnet".into(),
                "".into(),
                "BONNET".into(),
            ],
            rows: vec![
                text_row(&["TOYOTA", "COROLLA", "2020", "DELHI", "5", "x", "7"]),
                text_row(&["", "", "", "", "", "", ""]),
                text_row(&["HONDA", "CITY", "2019.0", "MUMBAI", "3"]),
            ],
        }
    }

    #[test]
    fn labour_headers_normalized() {
        let table = load_labour(&labour_sheet());
        assert_eq!(
            table.columns,
            vec!["MAKER", "MODEL", "YEAR", "CITY", "BONNET", "COL_5", "BONNET_1"]
        );
        assert!(table.is_usable());
        let parts: Vec<&str> = table.part_columns().collect();
        assert_eq!(parts, vec!["BONNET", "COL_5", "BONNET_1"]);
    }

    #[test]
    fn blank_rows_dropped() {
        let table = load_labour(&labour_sheet());
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.dropped_rows, 1);
    }

    #[test]
    fn ragged_rows_padded() {
        let table = load_labour(&labour_sheet());
        let honda = &table.rows[1];
        assert_eq!(honda.value("BONNET"), 3.0);
        assert_eq!(honda.value("BONNET_1"), 0.0);
        assert_eq!(honda.parts.get("COL_5"), Some(&CellValue::Empty));
    }

    #[test]
    fn year_coerced_to_text() {
        let table = load_labour(&labour_sheet());
        assert_eq!(table.rows[0].year, "2020");
        assert_eq!(table.rows[1].year, "2019");

        assert_eq!(coerce_year(&CellValue::Number(2021.0)), "2021");
        assert_eq!(coerce_year(&CellValue::Text(" 2022 ".into())), "2022");
        assert_eq!(coerce_year(&CellValue::Text("MY2022".into())), "MY2022");
        assert_eq!(coerce_year(&CellValue::Empty), "");
    }

    #[test]
    fn paint_rows_carry_finish() {
        let sheet = RawSheet {
            headers: vec![
                "MAKER".into(),
                "MODEL".into(),
                "YEAR".into(),
                "CITY".into(),
                "W_METALLIC/SOLID".into(),
                "BONNET".into(),
            ],
            rows: vec![vec![
                "TOYOTA".into(),
                "COROLLA".into(),
                CellValue::Number(2020.0),
                "DELHI".into(),
                "SOLID".into(),
                CellValue::Number(1000.0),
            ]],
        };
        let table = load_paint(&sheet);
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.year, "2020");
        assert_eq!(row.finish.as_deref(), Some("SOLID"));
        assert_eq!(row.value("BONNET"), 1000.0);
        assert!(!row.parts.contains_key("W_METALLIC/SOLID"));
    }

    #[test]
    fn missing_identity_column_yields_no_rows() {
        let sheet = RawSheet {
            headers: vec!["MAKER".into(), "MODEL".into(), "CITY".into(), "BONNET".into()],
            rows: vec![text_row(&["TOYOTA", "COROLLA", "DELHI", "5"])],
        };
        let table = load_labour(&sheet);
        assert!(!table.is_usable());
        assert_eq!(table.missing_columns, vec!["YEAR"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn paint_without_finish_is_unusable() {
        let sheet = RawSheet {
            headers: vec!["MAKER".into(), "MODEL".into(), "YEAR".into(), "CITY".into()],
            rows: vec![text_row(&["TOYOTA", "COROLLA", "2020", "DELHI"])],
        };
        let table = load_paint(&sheet);
        assert_eq!(table.missing_columns, vec!["W_METALLIC/SOLID"]);
    }

    #[test]
    fn empty_sheet_is_unusable_not_fatal() {
        let table = load_labour(&RawSheet::default());
        assert!(table.rows.is_empty());
        assert_eq!(table.missing_columns.len(), 4);
    }

    #[test]
    fn part_set_from_first_column() {
        let grid = vec![
            text_row(&[" bonnet", "ignored"]),
            text_row(&["Front Bumper"]),
            text_row(&["BONNET"]),
            text_row(&["", "x"]),
            Vec::new(),
        ];
        let set = load_part_set(&grid);
        assert_eq!(set.len(), 2);
        assert!(set.contains("BONNET"));
        assert!(set.contains("FRONT BUMPER"));
        assert!(!set.contains("IGNORED"));
    }
}
