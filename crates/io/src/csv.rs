// CSV/TSV sheet reading

use std::io::Read;
use std::path::Path;

use repairgrid_estimator::CellValue;

use crate::error::SourceError;

/// How field text becomes a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    /// Keep every field as text. Raw grids (labour, eligibility lists).
    Text,
    /// Fields that read as plain numbers become numbers. Self-describing
    /// records (paint), where the sheet already typed its values.
    Typed,
}

pub fn read_grid(path: &Path, mode: CellMode) -> Result<Vec<Vec<CellValue>>, SourceError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    parse_grid(&content, delimiter, mode).map_err(|e| SourceError::csv(path, e))
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                ::csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts.first().copied().unwrap_or(0);
        if target <= 1 {
            continue;
        }

        // Lines agreeing with line 1, weighted by field count
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252).
pub fn read_file_as_utf8(path: &Path) -> Result<String, SourceError> {
    let mut file = std::fs::File::open(path).map_err(|e| SourceError::io(path, e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| SourceError::io(path, e))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(s)),
        Err(e) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Parse CSV text into rows of cells. Rows keep their own width; the loader
/// pads them against the header row.
pub fn parse_grid(
    content: &str,
    delimiter: u8,
    mode: CellMode,
) -> Result<Vec<Vec<CellValue>>, ::csv::Error> {
    let mut reader = ::csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut grid = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row: Vec<CellValue> = record
            .iter()
            .map(|field| match mode {
                // Header row stays text even in typed mode
                CellMode::Typed if row_idx > 0 => typed_cell(field),
                _ => text_cell(field),
            })
            .collect();
        grid.push(row);
    }
    Ok(grid)
}

fn text_cell(field: &str) -> CellValue {
    if field.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(field.to_string())
    }
}

fn typed_cell(field: &str) -> CellValue {
    let trimmed = field.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => text_cell(field),
    }
}
