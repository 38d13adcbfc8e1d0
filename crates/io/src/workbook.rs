// Workbook sheet reading (xlsx, xlsm, xls, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use repairgrid_estimator::CellValue;

use crate::error::SourceError;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// True when the path names a spreadsheet workbook rather than a CSV file.
pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Read one worksheet as a grid. `sheet` selects by name; `None` takes the
/// first worksheet.
pub fn read_grid(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<CellValue>>, SourceError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| SourceError::workbook(path, e))?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.trim().eq_ignore_ascii_case(wanted.trim()))
            .cloned()
            .ok_or_else(|| {
                SourceError::workbook(
                    path,
                    format!("no worksheet named '{wanted}' (found: {})", names.join(", ")),
                )
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| SourceError::workbook(path, "workbook contains no sheets"))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| SourceError::workbook(path, format!("sheet '{name}': {e}")))?;

    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    log::debug!("{}#{name}: {} row(s)", path.display(), grid.len());
    Ok(grid)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        // Error cells price as zero downstream
        Data::Error(e) => CellValue::Text(format!("#{e:?}")),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use tempfile::tempdir;

    fn write_book(path: &Path) {
        let mut book = Workbook::new();

        let paint = book.add_worksheet();
        paint.set_name("Paint").unwrap();
        paint.write_string(0, 0, "MAKER").unwrap();
        paint.write_string(0, 1, "YEAR").unwrap();
        paint.write_string(0, 2, "BONNET").unwrap();
        paint.write_string(1, 0, "TOYOTA").unwrap();
        paint.write_number(1, 1, 2020).unwrap();
        paint.write_number(1, 2, 1000.5).unwrap();

        let labour = book.add_worksheet();
        labour.set_name("Labour").unwrap();
        labour.write_string(0, 0, "MAKER").unwrap();
        labour.write_boolean(1, 0, true).unwrap();

        book.save(path).unwrap();
    }

    #[test]
    fn detects_workbook_extensions() {
        assert!(is_workbook(Path::new("rates.xlsx")));
        assert!(is_workbook(Path::new("RATES.ODS")));
        assert!(!is_workbook(Path::new("rates.csv")));
        assert!(!is_workbook(Path::new("rates")));
    }

    #[test]
    fn first_sheet_by_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        write_book(&path);

        let grid = read_grid(&path, None).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0][0], CellValue::Text("MAKER".into()));
        assert_eq!(grid[1][1], CellValue::Number(2020.0));
        assert_eq!(grid[1][2], CellValue::Number(1000.5));
    }

    #[test]
    fn named_sheet_case_insensitive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        write_book(&path);

        let grid = read_grid(&path, Some("labour")).unwrap();
        assert_eq!(grid[1][0], CellValue::Bool(true));
    }

    #[test]
    fn unknown_sheet_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        write_book(&path);

        let err = read_grid(&path, Some("Rnr")).unwrap_err();
        match err {
            SourceError::Workbook { message, .. } => {
                assert!(message.contains("Paint, Labour"), "{message}")
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
