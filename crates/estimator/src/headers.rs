//! Header canonicalization.
//!
//! Sheets maintained by hand come with blank, duplicated and oddly cased
//! headers. Every column must stay addressable by a unique name, so the
//! normalizer never rejects a header row; it repairs it.

use std::collections::HashSet;

/// Canonical form of a part or column name: trimmed and upper-cased.
pub fn canonicalize(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Canonicalize a header row, one output per input position.
///
/// Blank headers become `COL_<i>`; repeats of an earlier name get `_1`,
/// `_2`, ... appended until unique.
pub fn normalize_headers<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut out = Vec::with_capacity(headers.len());

    for (i, raw) in headers.iter().enumerate() {
        let base = match canonicalize(raw.as_ref()) {
            h if h.is_empty() => format!("COL_{i}"),
            h => h,
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }

        seen.insert(candidate.clone());
        out.push(candidate);
    }

    out
}
