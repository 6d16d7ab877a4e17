//! Salary-period ledger engine: snapshot generation, partial-edit merge and
//! read-side aggregation.
//!
//! All arithmetic is done on `rust_decimal::Decimal`; floats only appear at
//! the response boundary. The functions here are pure over the ledger map —
//! the API layer owns reading and writing the period row.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::salary::{Ledger, LedgerEntry};

/// Active-staff snapshot row consumed once at period generation.
#[derive(Debug, sqlx::FromRow)]
pub struct StaffSnapshot {
    pub id: u64,
    pub name: String,
    pub salary: Option<Decimal>,
}

/// Period-level aggregates derived fresh on every read, never stored.
#[derive(Debug, PartialEq)]
pub struct Aggregates {
    pub total_taken: Decimal,
    pub total_remainder: Decimal,
}

/// Build the ledger for a new period from the active-staff snapshot.
///
/// One entry per staff member: nothing taken yet, remainder equals the full
/// salary, missing salary treated as zero. Returns the ledger and the period
/// total (sum of salaries). The snapshot is a one-time copy; later staff
/// changes never touch an already generated period.
pub fn generate_ledger(staff: &[StaffSnapshot]) -> (Ledger, Decimal) {
    let mut ledger = Ledger::new();
    let mut total = Decimal::ZERO;

    for member in staff {
        let salary = member.salary.unwrap_or(Decimal::ZERO);
        ledger.insert(
            member.id.to_string(),
            LedgerEntry {
                name: member.name.clone(),
                salary,
                taken: Decimal::ZERO,
                remainder: salary,
                description: String::new(),
            },
        );
        total += salary;
    }

    (ledger, total)
}

/// Merge a partial-edit map (`staff id -> patch object`) into the ledger.
///
/// Field resolution per entry: incoming value if present and parseable,
/// else the stored value, else the type default. A staff id unknown to the
/// ledger starts from all defaults, so the request may introduce entries
/// that were not in the generated snapshot. Malformed monetary input is
/// absorbed at field level and never blocks the other entries in the batch.
///
/// Returns whether any entry actually changed (structural comparison); the
/// caller recomputes the cached period total only in that case.
pub fn merge_entries(ledger: &mut Ledger, incoming: &Map<String, Value>) -> bool {
    let mut changed = false;

    for (staff_id, patch) in incoming {
        let Some(patch) = patch.as_object() else {
            warn!(staff_id = %staff_id, "ledger patch entry is not an object, skipping");
            continue;
        };

        let existing = ledger.get(staff_id).cloned().unwrap_or_default();

        let salary = resolve_decimal(patch.get("salary"), existing.salary);
        let taken = resolve_decimal(patch.get("taken"), existing.taken);
        let merged = LedgerEntry {
            name: resolve_string(patch.get("name"), &existing.name),
            salary,
            taken,
            remainder: salary - taken,
            description: resolve_string(patch.get("description"), &existing.description),
        };

        if ledger.get(staff_id) != Some(&merged) {
            ledger.insert(staff_id.clone(), merged);
            changed = true;
        }
    }

    changed
}

/// Sum of `salary` over the full entry set. Assigned to the cached period
/// total only after a merge that changed the ledger.
pub fn ledger_total(ledger: &Ledger) -> Decimal {
    ledger.values().map(|entry| entry.salary).sum()
}

/// Refresh every entry's `remainder` in place and derive the read-only
/// period aggregates. Stored remainders may be stale; output never is.
pub fn refresh_aggregates(ledger: &mut Ledger) -> Aggregates {
    let mut total_taken = Decimal::ZERO;
    let mut total_remainder = Decimal::ZERO;

    for entry in ledger.values_mut() {
        entry.remainder = entry.salary - entry.taken;
        total_taken += entry.taken;
        total_remainder += entry.remainder;
    }

    Aggregates {
        total_taken,
        total_remainder,
    }
}

/// Decimal for the response boundary; aggregates are emitted as floats.
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn resolve_decimal(incoming: Option<&Value>, fallback: Decimal) -> Decimal {
    match incoming {
        Some(Value::String(s)) => s.trim().parse().unwrap_or(fallback),
        Some(Value::Number(n)) => n.to_string().parse().unwrap_or(fallback),
        _ => fallback,
    }
}

fn resolve_string(incoming: Option<&Value>, fallback: &str) -> String {
    match incoming {
        Some(Value::String(s)) => s.clone(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn snapshot(id: u64, name: &str, salary: Option<Decimal>) -> StaffSnapshot {
        StaffSnapshot {
            id,
            name: name.to_string(),
            salary,
        }
    }

    fn patch(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn generation_seeds_entries_and_total() {
        let staff = vec![
            snapshot(1, "Ahmad", Some(dec!(1000.00))),
            snapshot(2, "Bashir", Some(dec!(500.00))),
        ];

        let (ledger, total) = generate_ledger(&staff);

        assert_eq!(total, dec!(1500.00));
        assert_eq!(ledger.len(), 2);
        let first = &ledger["1"];
        assert_eq!(first.name, "Ahmad");
        assert_eq!(first.salary, dec!(1000.00));
        assert_eq!(first.taken, Decimal::ZERO);
        assert_eq!(first.remainder, dec!(1000.00));
        assert_eq!(first.description, "");
    }

    #[test]
    fn generation_total_matches_salary_sum() {
        let staff = vec![
            snapshot(1, "A", Some(dec!(123.45))),
            snapshot(2, "B", Some(dec!(0.55))),
            snapshot(3, "C", Some(dec!(9000))),
        ];

        let (ledger, total) = generate_ledger(&staff);
        assert_eq!(total, ledger_total(&ledger));
        assert_eq!(total, dec!(9124.00));
    }

    #[test]
    fn generation_treats_missing_salary_as_zero() {
        let staff = vec![snapshot(5, "NoPay", None)];

        let (ledger, total) = generate_ledger(&staff);

        assert_eq!(total, Decimal::ZERO);
        assert_eq!(ledger["5"].salary, Decimal::ZERO);
        assert_eq!(ledger["5"].remainder, Decimal::ZERO);
    }

    #[test]
    fn merge_applies_taken_and_recomputes_remainder() {
        let (mut ledger, _) = generate_ledger(&[snapshot(1, "A", Some(dec!(1000.00)))]);

        let changed = merge_entries(&mut ledger, &patch(json!({"1": {"taken": "300"}})));

        assert!(changed);
        assert_eq!(ledger["1"].taken, dec!(300));
        assert_eq!(ledger["1"].remainder, dec!(700.00));
        assert_eq!(ledger["1"].salary, dec!(1000.00));
        assert_eq!(ledger["1"].name, "A");
    }

    #[test]
    fn merge_accepts_json_numbers_for_monetary_fields() {
        let (mut ledger, _) = generate_ledger(&[snapshot(1, "A", Some(dec!(1000.00)))]);

        let changed = merge_entries(&mut ledger, &patch(json!({"1": {"taken": 250.5}})));

        assert!(changed);
        assert_eq!(ledger["1"].taken, dec!(250.5));
        assert_eq!(ledger["1"].remainder, dec!(749.50));
    }

    #[test]
    fn malformed_monetary_input_falls_back_to_stored_value() {
        let (mut ledger, _) = generate_ledger(&[snapshot(1, "A", Some(dec!(1000.00)))]);
        merge_entries(&mut ledger, &patch(json!({"1": {"taken": "300"}})));

        let changed = merge_entries(&mut ledger, &patch(json!({"1": {"taken": "abc"}})));

        assert!(!changed);
        assert_eq!(ledger["1"].taken, dec!(300));
        assert_eq!(ledger["1"].remainder, dec!(700.00));
    }

    #[test]
    fn malformed_field_does_not_block_sibling_entries() {
        let (mut ledger, _) = generate_ledger(&[
            snapshot(1, "A", Some(dec!(1000.00))),
            snapshot(2, "B", Some(dec!(800.00))),
        ]);

        let changed = merge_entries(
            &mut ledger,
            &patch(json!({
                "1": {"taken": "not a number"},
                "2": {"taken": "100.00"}
            })),
        );

        assert!(changed);
        assert_eq!(ledger["1"].taken, Decimal::ZERO);
        assert_eq!(ledger["2"].taken, dec!(100.00));
        assert_eq!(ledger["2"].remainder, dec!(700.00));
    }

    #[test]
    fn merge_leaves_unnamed_entries_untouched() {
        let (mut ledger, _) = generate_ledger(&[
            snapshot(1, "A", Some(dec!(1000.00))),
            snapshot(2, "B", Some(dec!(800.00))),
        ]);
        let before = ledger["2"].clone();

        merge_entries(
            &mut ledger,
            &patch(json!({"1": {"taken": "50", "description": "advance"}})),
        );

        assert_eq!(ledger["2"], before);
    }

    #[test]
    fn identical_merge_reports_no_change() {
        let (mut ledger, _) = generate_ledger(&[snapshot(1, "A", Some(dec!(1000.00)))]);
        let update = patch(json!({"1": {"taken": "300", "description": "adv"}}));

        assert!(merge_entries(&mut ledger, &update));
        let snapshot_after = ledger.clone();

        assert!(!merge_entries(&mut ledger, &update));
        assert_eq!(ledger, snapshot_after);
    }

    #[test]
    fn over_disbursement_yields_negative_remainder() {
        let (mut ledger, _) = generate_ledger(&[snapshot(1, "A", Some(dec!(100.00)))]);

        merge_entries(&mut ledger, &patch(json!({"1": {"taken": "150"}})));

        assert_eq!(ledger["1"].remainder, dec!(-50.00));
    }

    #[test]
    fn unknown_staff_id_creates_defaulted_entry() {
        let (mut ledger, _) = generate_ledger(&[snapshot(1, "A", Some(dec!(1000.00)))]);

        let changed = merge_entries(
            &mut ledger,
            &patch(json!({"99": {"name": "New Hire", "salary": "600"}})),
        );

        assert!(changed);
        let entry = &ledger["99"];
        assert_eq!(entry.name, "New Hire");
        assert_eq!(entry.salary, dec!(600));
        assert_eq!(entry.taken, Decimal::ZERO);
        assert_eq!(entry.remainder, dec!(600));
        assert_eq!(entry.description, "");
    }

    #[test]
    fn non_object_patch_value_is_skipped() {
        let (mut ledger, _) = generate_ledger(&[snapshot(1, "A", Some(dec!(1000.00)))]);
        let before = ledger.clone();

        let changed = merge_entries(&mut ledger, &patch(json!({"1": "garbage"})));

        assert!(!changed);
        assert_eq!(ledger, before);
    }

    #[test]
    fn changed_merge_total_covers_full_entry_set() {
        let (mut ledger, total) = generate_ledger(&[
            snapshot(1, "A", Some(dec!(1000.00))),
            snapshot(2, "B", Some(dec!(800.00))),
        ]);
        assert_eq!(total, dec!(1800.00));

        // Only entry 1 is in the request; the recomputed total must still
        // include entry 2's salary.
        let changed = merge_entries(&mut ledger, &patch(json!({"1": {"salary": "1200"}})));
        assert!(changed);
        assert_eq!(ledger_total(&ledger), dec!(2000.00));
    }

    #[test]
    fn aggregates_recompute_stale_remainders() {
        let (mut ledger, _) = generate_ledger(&[
            snapshot(1, "A", Some(dec!(1000.00))),
            snapshot(2, "B", Some(dec!(500.00))),
        ]);
        merge_entries(&mut ledger, &patch(json!({"1": {"taken": "300"}})));

        // Simulate a stale stored remainder.
        ledger.get_mut("2").unwrap().remainder = dec!(9999);

        let aggregates = refresh_aggregates(&mut ledger);

        assert_eq!(aggregates.total_taken, dec!(300));
        assert_eq!(aggregates.total_remainder, dec!(1200.00));
        assert_eq!(ledger["2"].remainder, dec!(500.00));
    }

    // The end-to-end reconciliation walk: generate from one active staff
    // member, disburse, then submit a malformed follow-up.
    #[test]
    fn reconciliation_scenario() {
        let active = vec![snapshot(1, "A", Some(dec!(1000)))];
        let (mut ledger, total) = generate_ledger(&active);
        assert_eq!(total, dec!(1000));
        assert_eq!(ledger.len(), 1);

        let changed = merge_entries(&mut ledger, &patch(json!({"1": {"taken": "300"}})));
        assert!(changed);
        assert_eq!(ledger["1"].remainder, dec!(700));
        assert_eq!(ledger_total(&ledger), dec!(1000));

        let aggregates = refresh_aggregates(&mut ledger);
        assert_eq!(aggregates.total_taken, dec!(300));
        assert_eq!(aggregates.total_remainder, dec!(700));

        let changed = merge_entries(&mut ledger, &patch(json!({"1": {"taken": "abc"}})));
        assert!(!changed);
        assert_eq!(ledger["1"].taken, dec!(300));
    }
}
