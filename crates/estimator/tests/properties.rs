// Property-based tests for normalization, part-table sync and totals.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;
use repairgrid_estimator::calculator::{calculate, Eligibility};
use repairgrid_estimator::headers::normalize_headers;
use repairgrid_estimator::model::{
    CellValue, ContextMatches, PartSet, ReferenceRow, VehicleContext,
};
use repairgrid_estimator::numeric::{round2, safe_number};
use repairgrid_estimator::{CategoryRates, PartRecord, PartTable};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Header: often blank or a collision-prone name, sometimes free text.
fn arb_header() -> impl Strategy<Value = String> {
    prop_oneof![
        2 => Just("".to_string()),
        2 => Just("  ".to_string()),
        3 => prop::sample::select(vec!["bonnet", "BONNET", " Door", "door_1", "COL_1", "COL_2"])
            .prop_map(str::to_string),
        2 => r"[a-zA-Z_ ]{0,8}",
    ]
}

fn arb_part() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["BONNET", "DOOR", "ROOF", "FENDER", "BUMPER", "MIRROR"])
        .prop_map(str::to_string)
}

/// Raw cell as a user might type it.
fn arb_cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        3 => (0.0..100_000.0f64).prop_map(CellValue::Number),
        2 => r"-?[0-9]{1,5}(\.[0-9]{1,3})?".prop_map(CellValue::Text),
        1 => r"[a-z ]{0,6}".prop_map(CellValue::Text),
        1 => Just(CellValue::Empty),
    ]
}

#[derive(Debug, Clone)]
struct Edit {
    discount: CellValue,
    rnr: bool,
    rnr_cost: CellValue,
    tinkering: bool,
    tinkering_cost: CellValue,
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    (arb_cell(), any::<bool>(), arb_cell(), any::<bool>(), arb_cell()).prop_map(
        |(discount, rnr, rnr_cost, tinkering, tinkering_cost)| Edit {
            discount,
            rnr,
            rnr_cost,
            tinkering,
            tinkering_cost,
        },
    )
}

fn apply(table: &mut PartTable, part: &str, edit: &Edit) {
    table.set_discount(part, safe_number(&edit.discount)).unwrap();
    table.set_rnr(part, edit.rnr).unwrap();
    table.set_rnr_cost(part, safe_number(&edit.rnr_cost)).unwrap();
    table.set_tinkering(part, edit.tinkering).unwrap();
    table.set_tinkering_cost(part, safe_number(&edit.tinkering_cost)).unwrap();
}

fn row(values: &[(String, f64)]) -> ReferenceRow {
    ReferenceRow {
        maker: "M".into(),
        model: "X".into(),
        year: "2020".into(),
        city: "C".into(),
        finish: None,
        parts: values
            .iter()
            .map(|(k, v)| (k.clone(), CellValue::Number(*v)))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn normalized_headers_unique_and_non_blank(headers in prop::collection::vec(arb_header(), 0..12)) {
        let out = normalize_headers(&headers);
        prop_assert_eq!(out.len(), headers.len());

        let unique: HashSet<&String> = out.iter().collect();
        prop_assert_eq!(unique.len(), out.len());

        for name in &out {
            prop_assert!(!name.trim().is_empty());
            prop_assert_eq!(name.trim(), name.as_str());
        }
    }

    #[test]
    fn normalized_headers_keep_position(headers in prop::collection::vec(arb_header(), 1..12)) {
        let out = normalize_headers(&headers);
        for (i, (raw, name)) in headers.iter().zip(&out).enumerate() {
            let canonical = raw.trim().to_uppercase();
            if canonical.is_empty() {
                prop_assert!(name.starts_with(&format!("COL_{i}")), "{} at {}", name, i);
            } else {
                prop_assert!(name.starts_with(&canonical), "{} from {}", name, raw);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Part table sync
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn sync_twice_is_noop(
        chosen in prop::collection::vec(arb_part(), 0..6),
        edits in prop::collection::vec(arb_edit(), 6),
    ) {
        let mut table = PartTable::new();
        table.sync(&chosen);
        let parts: Vec<String> = table.records().iter().map(|r| r.part.clone()).collect();
        for (part, edit) in parts.iter().zip(&edits) {
            apply(&mut table, part, edit);
        }

        let before = table.clone();
        table.sync(&chosen);
        prop_assert_eq!(table, before);
    }

    #[test]
    fn sync_keeps_edits_of_still_chosen_parts(
        first in prop::collection::vec(arb_part(), 1..6),
        second in prop::collection::vec(arb_part(), 0..6),
        edit in arb_edit(),
    ) {
        let mut table = PartTable::new();
        table.sync(&first);
        let edited = first[0].clone();
        apply(&mut table, &edited, &edit);
        let record = table.get(&edited).cloned();

        table.sync(&second);
        if second.contains(&edited) {
            prop_assert_eq!(table.get(&edited).cloned(), record);
        } else {
            prop_assert!(!table.contains(&edited));
        }

        let expected: HashSet<&String> = second.iter().collect();
        let actual: HashSet<&String> = table.records().iter().map(|r| &r.part).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn edits_stay_in_range(edit in arb_edit()) {
        let mut table = PartTable::new();
        table.add("BONNET");
        apply(&mut table, "BONNET", &edit);
        let r = table.get("BONNET").unwrap();
        prop_assert!((0.0..=100.0).contains(&r.discount_pct));
        prop_assert!(r.rnr_cost >= 0.0 && r.rnr_cost.is_finite());
        prop_assert!(r.tinkering_cost >= 0.0 && r.tinkering_cost.is_finite());
    }
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn grand_total_is_sum_of_displayed_sub_totals(
        chosen in prop::collection::vec(arb_part(), 1..6),
        edits in prop::collection::vec(arb_edit(), 6),
        paint_values in prop::collection::vec(0.0..50_000.0f64, 6),
        labour_values in prop::collection::vec(0.0..20.0f64, 6),
        eligible in prop::collection::vec(any::<(bool, bool)>(), 6),
    ) {
        let names = ["BONNET", "DOOR", "ROOF", "FENDER", "BUMPER", "MIRROR"];
        let paint = row(&names.iter().map(|n| n.to_string()).zip(paint_values).collect::<Vec<_>>());
        let labour = row(&names.iter().map(|n| n.to_string()).zip(labour_values).collect::<Vec<_>>());
        let tinkering: PartSet = names.iter().zip(&eligible).filter(|(_, e)| e.0).map(|(n, _)| *n).collect();
        let rnr: PartSet = names.iter().zip(&eligible).filter(|(_, e)| e.1).map(|(n, _)| *n).collect();

        let mut table = PartTable::new();
        table.sync(&chosen);
        let parts: Vec<String> = table.records().iter().map(|r| r.part.clone()).collect();
        for (part, edit) in parts.iter().zip(&edits) {
            apply(&mut table, part, edit);
        }
        let records: Vec<&PartRecord> = table.records().iter().collect();

        let ctx = VehicleContext {
            paint: &paint,
            labour: &labour,
            matches: ContextMatches { paint: 1, labour: 1 },
        };
        let (lines, summary) = calculate(
            &ctx,
            &records,
            Eligibility { tinkering: &tinkering, rnr: &rnr },
            &CategoryRates::default(),
        );
        prop_assert_eq!(lines.len(), records.len());

        let displayed = round2(summary.rnr) + round2(summary.tinkering) + round2(summary.painting);
        prop_assert_eq!(summary.display_grand_total(), round2(displayed));

        let json = serde_json::to_value(summary).unwrap();
        let sum = json["rnr"].as_f64().unwrap()
            + json["tinkering"].as_f64().unwrap()
            + json["painting"].as_f64().unwrap();
        prop_assert!((json["grand_total"].as_f64().unwrap() - sum).abs() < 1e-6);
    }

    #[test]
    fn ineligible_parts_without_override_cost_nothing(base in 0.0..1000.0f64, part in arb_part()) {
        let labour = row(&[(part.clone(), base)]);
        let paint = row(&[]);
        let empty = PartSet::default();
        let ctx = VehicleContext {
            paint: &paint,
            labour: &labour,
            matches: ContextMatches { paint: 1, labour: 1 },
        };
        let record = PartRecord::new(&part);
        let (lines, _) = calculate(
            &ctx,
            &[&record],
            Eligibility { tinkering: &empty, rnr: &empty },
            &CategoryRates::default(),
        );
        prop_assert_eq!(lines[0].tinkering_cost, 0.0);
        prop_assert_eq!(lines[0].rnr_cost, 0.0);
    }
}
